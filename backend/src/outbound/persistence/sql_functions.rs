//! PostgreSQL string functions used by repository filters.

use diesel::sql_types::Text;

diesel::define_sql_function! {
    fn lower(value: Text) -> Text;
}

diesel::define_sql_function! {
    fn btrim(value: Text) -> Text;
}

diesel::define_sql_function! {
    fn regexp_replace(value: Text, pattern: Text, replacement: Text, flags: Text) -> Text;
}
