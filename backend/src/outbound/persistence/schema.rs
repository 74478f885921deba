//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the files under `backend/migrations`. When a
//! migration changes a table, update the matching block here (or regenerate
//! it with `diesel print-schema`).

diesel::table! {
    /// Showroom user groups. Contractor groups carry a module grant.
    user_groups (id) {
        id -> Uuid,
        name -> Text,
        group_type -> Text,
        /// JSON object of module toggles; older rows hold it as a string.
        modules -> Jsonb,
        multiplier -> Numeric,
        multiplier_enabled -> Bool,
        contractor_settings -> Jsonb,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    locations (id) {
        id -> Uuid,
        name -> Text,
        address -> Nullable<Text>,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        website -> Nullable<Text>,
        time_zone -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Staff and contractor accounts. Rows are soft-deleted.
    users (id) {
        id -> Uuid,
        name -> Text,
        /// Normalised lower-case address, unique across all rows.
        email -> Text,
        role -> Text,
        group_id -> Nullable<Uuid>,
        location_id -> Nullable<Uuid>,
        /// Argon2id PHC string.
        password_hash -> Text,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    manufacturers (id) {
        id -> Uuid,
        name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        address -> Nullable<Text>,
        website -> Nullable<Text>,
        is_active -> Bool,
        cost_multiplier -> Numeric,
        instructions -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Price list rows, unique per `(manufacturer_id, code, style)`.
    catalog_items (id) {
        id -> Uuid,
        manufacturer_id -> Uuid,
        code -> Text,
        description -> Nullable<Text>,
        style -> Text,
        item_type -> Nullable<Text>,
        price -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    catalog_assembly_costs (catalog_item_id) {
        catalog_item_id -> Uuid,
        kind -> Text,
        amount -> Numeric,
    }
}

diesel::table! {
    /// Template groups; a null manufacturer means the shared gallery.
    modification_categories (id) {
        id -> Uuid,
        name -> Text,
        manufacturer_id -> Nullable<Uuid>,
        order_index -> Int4,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Gallery blueprints (no manufacturer, no price) and manufacturer mods.
    modification_templates (id) {
        id -> Uuid,
        category_id -> Nullable<Uuid>,
        name -> Text,
        manufacturer_id -> Nullable<Uuid>,
        price -> Nullable<Numeric>,
        is_ready -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Which catalog items a template applies to. `scope` selects the
    /// target column that is read.
    modification_assignments (id) {
        id -> Uuid,
        template_id -> Uuid,
        manufacturer_id -> Uuid,
        scope -> Text,
        target_style -> Nullable<Text>,
        target_type -> Nullable<Text>,
        catalog_item_id -> Nullable<Uuid>,
        override_price -> Nullable<Numeric>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        name -> Text,
        email -> Nullable<Text>,
        mobile -> Nullable<Text>,
        home_phone -> Nullable<Text>,
        address -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        zip -> Nullable<Text>,
        company -> Nullable<Text>,
        customer_type -> Nullable<Text>,
        lead_source -> Nullable<Text>,
        note -> Nullable<Text>,
        group_id -> Nullable<Uuid>,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Quotes moving through the sales pipeline.
    proposals (id) {
        id -> Uuid,
        /// `PREFIX-SSS-MMDDYY`, unique when present.
        number -> Nullable<Text>,
        customer_id -> Nullable<Uuid>,
        manufacturer_id -> Nullable<Uuid>,
        owner_group_id -> Nullable<Uuid>,
        created_by -> Nullable<Uuid>,
        designer_id -> Nullable<Uuid>,
        sales_rep -> Nullable<Text>,
        lead_source -> Nullable<Text>,
        location_id -> Nullable<Uuid>,
        kind -> Text,
        status -> Text,
        date -> Timestamptz,
        follow_up_dates -> Array<Timestamptz>,
        description -> Nullable<Text>,
        manufacturers_data -> Jsonb,
        grand_total -> Nullable<Numeric>,
        is_locked -> Bool,
        accepted_at -> Nullable<Timestamptz>,
        accepted_by -> Nullable<Text>,
        sent_at -> Nullable<Timestamptz>,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Public proposal links. Only the SHA-256 of the token is stored.
    share_sessions (id) {
        id -> Uuid,
        proposal_id -> Uuid,
        token_hash -> Text,
        recipient_email -> Nullable<Text>,
        created_by -> Nullable<Uuid>,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Accepted proposals. At most one order per proposal.
    orders (id) {
        id -> Uuid,
        proposal_id -> Uuid,
        number -> Nullable<Text>,
        number_date -> Nullable<Date>,
        number_seq -> Nullable<Int4>,
        owner_group_id -> Nullable<Uuid>,
        customer_id -> Nullable<Uuid>,
        manufacturer_id -> Nullable<Uuid>,
        style_name -> Nullable<Text>,
        accepted_by -> Nullable<Text>,
        accepted_at -> Nullable<Timestamptz>,
        status -> Text,
        grand_total -> Numeric,
        /// Proposal as it looked at acceptance.
        snapshot -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        order_id -> Uuid,
        amount -> Numeric,
        currency -> Text,
        status -> Text,
        payment_method -> Nullable<Text>,
        transaction_id -> Nullable<Text>,
        gateway_response -> Nullable<Jsonb>,
        created_by -> Nullable<Uuid>,
        paid_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    taxes (id) {
        id -> Uuid,
        label -> Text,
        value -> Numeric,
        is_default -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    resource_links (id) {
        id -> Uuid,
        title -> Text,
        url -> Text,
        kind -> Text,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(users -> user_groups (group_id));
diesel::joinable!(catalog_items -> manufacturers (manufacturer_id));
diesel::joinable!(catalog_assembly_costs -> catalog_items (catalog_item_id));
diesel::joinable!(modification_templates -> modification_categories (category_id));
diesel::joinable!(modification_assignments -> modification_templates (template_id));
diesel::joinable!(share_sessions -> proposals (proposal_id));
diesel::joinable!(orders -> proposals (proposal_id));
diesel::joinable!(payments -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    user_groups,
    locations,
    users,
    manufacturers,
    catalog_items,
    catalog_assembly_costs,
    modification_categories,
    modification_templates,
    modification_assignments,
    customers,
    proposals,
    share_sessions,
    orders,
    payments,
    taxes,
    resource_links,
);
