//! Modification templates: priced add-ons a manufacturer offers on top of its
//! catalog items (finished ends, glass doors, roll-out trays).
//!
//! Templates live either in the shared gallery as unpriced blueprints or
//! under a manufacturer with a price. Categories group templates within the
//! same owner. Assignments decide which catalog items a manufacturer's
//! template applies to, and may override its price.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::CatalogItem;

/// Validation errors for modification payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModificationValidationError {
    #[error("name is required")]
    EmptyName,
    #[error("manufacturer scope requires a manufacturer")]
    MissingManufacturer,
    #[error("gallery entries cannot belong to a manufacturer")]
    GalleryWithManufacturer,
    #[error("blueprints cannot have a price")]
    BlueprintWithPrice,
    #[error("price must not be negative")]
    NegativePrice,
    #[error("assignment scope {scope} needs a {field}")]
    MissingTarget { scope: &'static str, field: &'static str },
    #[error("unknown assignment scope {0}")]
    UnknownScope(String),
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn required_name(name: &str) -> Result<String, ModificationValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModificationValidationError::EmptyName);
    }
    Ok(name.to_owned())
}

fn non_negative(price: Option<Decimal>) -> Result<Option<Decimal>, ModificationValidationError> {
    match price {
        Some(p) if p < Decimal::ZERO => Err(ModificationValidationError::NegativePrice),
        other => Ok(other),
    }
}

/// Who owns a category or template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Shared gallery of blueprints.
    Gallery,
    Manufacturer(Uuid),
}

impl Owner {
    /// Read a `(scope, manufacturer)` pair as sent by clients.
    pub fn try_new(
        scope: CategoryScope,
        manufacturer_id: Option<Uuid>,
    ) -> Result<Self, ModificationValidationError> {
        match (scope, manufacturer_id) {
            (CategoryScope::Gallery, None) => Ok(Self::Gallery),
            (CategoryScope::Gallery, Some(_)) => {
                Err(ModificationValidationError::GalleryWithManufacturer)
            }
            (CategoryScope::Manufacturer, Some(id)) => Ok(Self::Manufacturer(id)),
            (CategoryScope::Manufacturer, None) => {
                Err(ModificationValidationError::MissingManufacturer)
            }
        }
    }

    pub const fn from_manufacturer(manufacturer_id: Option<Uuid>) -> Self {
        match manufacturer_id {
            Some(id) => Self::Manufacturer(id),
            None => Self::Gallery,
        }
    }

    pub const fn manufacturer_id(self) -> Option<Uuid> {
        match self {
            Self::Gallery => None,
            Self::Manufacturer(id) => Some(id),
        }
    }

    pub const fn scope(self) -> CategoryScope {
        match self {
            Self::Gallery => CategoryScope::Gallery,
            Self::Manufacturer(_) => CategoryScope::Manufacturer,
        }
    }

    /// Price stored for a template of this owner.
    ///
    /// Blueprints stay unpriced; manufacturer templates default to zero.
    pub fn template_price(
        self,
        requested: Option<Decimal>,
    ) -> Result<Option<Decimal>, ModificationValidationError> {
        match (self, non_negative(requested)?) {
            (Self::Gallery, Some(_)) => Err(ModificationValidationError::BlueprintWithPrice),
            (Self::Gallery, None) => Ok(None),
            (Self::Manufacturer(_), price) => Ok(Some(price.unwrap_or(Decimal::ZERO))),
        }
    }
}

/// Wire form of [`Owner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryScope {
    #[default]
    Gallery,
    Manufacturer,
}

/// Named group of templates, ordered by `order_index` within its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationCategory {
    pub id: Uuid,
    pub name: String,
    pub owner: Owner,
    pub order_index: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated category fields. The owner is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub order_index: i32,
    pub description: Option<String>,
}

impl CategoryDraft {
    pub fn try_new(
        name: &str,
        order_index: i32,
        description: Option<&str>,
    ) -> Result<Self, ModificationValidationError> {
        Ok(Self {
            name: required_name(name)?,
            order_index,
            description: clean(description),
        })
    }
}

/// What happens to a category's templates when it is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryDeleteMode {
    /// Refuse while the category still holds templates.
    #[default]
    Only,
    /// Delete the templates and their assignments too.
    WithTemplates,
    /// Move the templates into another category of the same owner.
    MoveTo(Uuid),
}

/// A modification offered in the gallery or by one manufacturer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationTemplate {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub owner: Owner,
    /// Always `None` for blueprints.
    pub price: Option<Decimal>,
    pub is_ready: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModificationTemplate {
    pub const fn is_blueprint(&self) -> bool {
        matches!(self.owner, Owner::Gallery)
    }

    /// Case-insensitive name comparison used for duplicate checks.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Validated template fields; the price is checked against the owner later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub price: Option<Decimal>,
    pub is_ready: bool,
}

impl TemplateDraft {
    pub fn try_new(
        name: &str,
        category_id: Option<Uuid>,
        price: Option<Decimal>,
        is_ready: bool,
    ) -> Result<Self, ModificationValidationError> {
        Ok(Self {
            category_id,
            name: required_name(name)?,
            price: non_negative(price)?,
            is_ready,
        })
    }
}

/// Catalog items an assignment covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentTarget {
    /// Every item of the manufacturer.
    All,
    Style(String),
    Type(String),
    Item(Uuid),
}

impl AssignmentTarget {
    /// Build a target from the flat `(scope, style, type, item)` form.
    pub fn try_new(
        scope: &str,
        style: Option<&str>,
        item_type: Option<&str>,
        catalog_item_id: Option<Uuid>,
    ) -> Result<Self, ModificationValidationError> {
        let missing = |scope, field| ModificationValidationError::MissingTarget { scope, field };
        match scope.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "style" => clean(style).map(Self::Style).ok_or(missing("style", "target style")),
            "type" => clean(item_type)
                .map(Self::Type)
                .ok_or(missing("type", "target type")),
            "item" => catalog_item_id
                .map(Self::Item)
                .ok_or(missing("item", "catalog item")),
            other => Err(ModificationValidationError::UnknownScope(other.to_owned())),
        }
    }

    pub const fn scope(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Style(_) => "style",
            Self::Type(_) => "type",
            Self::Item(_) => "item",
        }
    }

    pub fn style(&self) -> Option<&str> {
        match self {
            Self::Style(style) => Some(style),
            _ => None,
        }
    }

    pub fn item_type(&self) -> Option<&str> {
        match self {
            Self::Type(item_type) => Some(item_type),
            _ => None,
        }
    }

    pub const fn catalog_item_id(&self) -> Option<Uuid> {
        match self {
            Self::Item(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether the target covers `item`. Style and type compare exactly.
    pub fn covers(&self, item: &CatalogItem) -> bool {
        match self {
            Self::All => true,
            Self::Style(style) => item.style == *style,
            Self::Type(item_type) => item.item_type.as_deref() == Some(item_type.as_str()),
            Self::Item(id) => item.id == *id,
        }
    }
}

/// Links a manufacturer template to some of its catalog items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationAssignment {
    pub id: Uuid,
    pub template_id: Uuid,
    pub manufacturer_id: Uuid,
    pub target: AssignmentTarget,
    /// Replaces the template price for the covered items.
    pub override_price: Option<Decimal>,
    /// An inactive item assignment hides the template from that item.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated assignment fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDraft {
    pub template_id: Uuid,
    pub target: AssignmentTarget,
    pub override_price: Option<Decimal>,
    pub is_active: bool,
}

impl AssignmentDraft {
    pub fn try_new(
        template_id: Uuid,
        target: AssignmentTarget,
        override_price: Option<Decimal>,
        is_active: bool,
    ) -> Result<Self, ModificationValidationError> {
        Ok(Self {
            template_id,
            target,
            override_price: non_negative(override_price)?,
            is_active,
        })
    }
}

/// Assignments that apply to `item`.
///
/// An inactive assignment targeting the item itself suppresses its template
/// for that item, whatever the broader assignments say. Other inactive
/// assignments are ignored.
pub fn applicable<'a>(
    assignments: &'a [ModificationAssignment],
    item: &CatalogItem,
) -> Vec<&'a ModificationAssignment> {
    let own: Vec<&ModificationAssignment> = assignments
        .iter()
        .filter(|a| a.manufacturer_id == item.manufacturer_id)
        .collect();
    let suppressed: HashSet<Uuid> = own
        .iter()
        .filter(|a| !a.is_active && a.target == AssignmentTarget::Item(item.id))
        .map(|a| a.template_id)
        .collect();
    own.into_iter()
        .filter(|a| a.is_active && !suppressed.contains(&a.template_id) && a.target.covers(item))
        .collect()
}

/// Unit price of a template, preferring the narrowest applicable override.
pub fn unit_price(
    template: &ModificationTemplate,
    assignments: &[&ModificationAssignment],
) -> Decimal {
    assignments
        .iter()
        .filter(|a| a.template_id == template.id)
        .min_by_key(|a| specificity(&a.target))
        .and_then(|a| a.override_price)
        .or(template.price)
        .unwrap_or(Decimal::ZERO)
}

const fn specificity(target: &AssignmentTarget) -> u8 {
    match target {
        AssignmentTarget::Item(_) => 0,
        AssignmentTarget::Type(_) => 1,
        AssignmentTarget::Style(_) => 2,
        AssignmentTarget::All => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn base_cabinet() -> CatalogItem {
        let now = Utc::now();
        CatalogItem {
            id: Uuid::new_v4(),
            manufacturer_id: Uuid::new_v4(),
            code: "B24".to_owned(),
            description: None,
            style: "Shaker".to_owned(),
            item_type: Some("Base".to_owned()),
            price: dec!(310),
            created_at: now,
            updated_at: now,
        }
    }

    fn template(owner: Owner, price: Option<Decimal>) -> ModificationTemplate {
        let now = Utc::now();
        ModificationTemplate {
            id: Uuid::new_v4(),
            category_id: None,
            name: "Finished end".to_owned(),
            owner,
            price,
            is_ready: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn assign(
        template_id: Uuid,
        manufacturer_id: Uuid,
        target: AssignmentTarget,
        override_price: Option<Decimal>,
        is_active: bool,
    ) -> ModificationAssignment {
        let now = Utc::now();
        ModificationAssignment {
            id: Uuid::new_v4(),
            template_id,
            manufacturer_id,
            target,
            override_price,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(CategoryScope::Gallery, false, Ok(CategoryScope::Gallery))]
    #[case(CategoryScope::Manufacturer, true, Ok(CategoryScope::Manufacturer))]
    #[case(
        CategoryScope::Gallery,
        true,
        Err(ModificationValidationError::GalleryWithManufacturer)
    )]
    #[case(
        CategoryScope::Manufacturer,
        false,
        Err(ModificationValidationError::MissingManufacturer)
    )]
    fn owner_follows_scope(
        #[case] scope: CategoryScope,
        #[case] with_manufacturer: bool,
        #[case] expected: Result<CategoryScope, ModificationValidationError>,
    ) {
        let manufacturer = with_manufacturer.then(Uuid::new_v4);
        assert_eq!(Owner::try_new(scope, manufacturer).map(Owner::scope), expected);
    }

    #[rstest]
    #[case::blueprint_unpriced(Owner::Gallery, None, Ok(None))]
    #[case::blueprint_priced(
        Owner::Gallery,
        Some(dec!(5)),
        Err(ModificationValidationError::BlueprintWithPrice)
    )]
    #[case::manufacturer_default(Owner::Manufacturer(Uuid::nil()), None, Ok(Some(Decimal::ZERO)))]
    #[case::manufacturer_priced(Owner::Manufacturer(Uuid::nil()), Some(dec!(45)), Ok(Some(dec!(45))))]
    #[case::negative(
        Owner::Manufacturer(Uuid::nil()),
        Some(dec!(-1)),
        Err(ModificationValidationError::NegativePrice)
    )]
    fn template_prices_follow_the_owner(
        #[case] owner: Owner,
        #[case] requested: Option<Decimal>,
        #[case] expected: Result<Option<Decimal>, ModificationValidationError>,
    ) {
        assert_eq!(owner.template_price(requested), expected);
    }

    #[rstest]
    #[case("all", None, None, false, Ok(AssignmentTarget::All))]
    #[case("", None, None, false, Ok(AssignmentTarget::All))]
    #[case("Style", Some("Shaker"), None, false, Ok(AssignmentTarget::Style("Shaker".to_owned())))]
    #[case("type", None, Some(" "), false, Err(ModificationValidationError::MissingTarget { scope: "type", field: "target type" }))]
    #[case("item", None, None, false, Err(ModificationValidationError::MissingTarget { scope: "item", field: "catalog item" }))]
    #[case("drawer", None, None, false, Err(ModificationValidationError::UnknownScope("drawer".to_owned())))]
    fn targets_need_their_value(
        #[case] scope: &str,
        #[case] style: Option<&str>,
        #[case] item_type: Option<&str>,
        #[case] with_item: bool,
        #[case] expected: Result<AssignmentTarget, ModificationValidationError>,
    ) {
        let item = with_item.then(Uuid::new_v4);
        assert_eq!(AssignmentTarget::try_new(scope, style, item_type, item), expected);
    }

    #[rstest]
    fn names_are_required() {
        assert_eq!(
            TemplateDraft::try_new("  ", None, None, false),
            Err(ModificationValidationError::EmptyName)
        );
        assert_eq!(
            CategoryDraft::try_new("", 0, None),
            Err(ModificationValidationError::EmptyName)
        );
    }

    #[rstest]
    fn broad_assignments_cover_matching_items(base_cabinet: CatalogItem) {
        let maker = base_cabinet.manufacturer_id;
        let id = Uuid::new_v4();
        let rows = vec![
            assign(id, maker, AssignmentTarget::Style("Shaker".to_owned()), None, true),
            assign(id, maker, AssignmentTarget::Style("Slab".to_owned()), None, true),
            assign(id, maker, AssignmentTarget::Type("Wall".to_owned()), None, true),
            assign(id, Uuid::new_v4(), AssignmentTarget::All, None, true),
        ];

        let found = applicable(&rows, &base_cabinet);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, AssignmentTarget::Style("Shaker".to_owned()));
    }

    #[rstest]
    fn inactive_item_assignment_suppresses_the_template(base_cabinet: CatalogItem) {
        let maker = base_cabinet.manufacturer_id;
        let hidden = Uuid::new_v4();
        let shown = Uuid::new_v4();
        let rows = vec![
            assign(hidden, maker, AssignmentTarget::All, None, true),
            assign(hidden, maker, AssignmentTarget::Item(base_cabinet.id), None, false),
            assign(shown, maker, AssignmentTarget::All, None, true),
            assign(shown, maker, AssignmentTarget::Item(Uuid::new_v4()), None, false),
        ];

        let templates: Vec<Uuid> = applicable(&rows, &base_cabinet)
            .into_iter()
            .map(|a| a.template_id)
            .collect();

        assert_eq!(templates, vec![shown]);
    }

    #[rstest]
    fn narrowest_override_wins(base_cabinet: CatalogItem) {
        let maker = base_cabinet.manufacturer_id;
        let mod_template = template(Owner::Manufacturer(maker), Some(dec!(40)));
        let rows = vec![
            assign(mod_template.id, maker, AssignmentTarget::All, Some(dec!(50)), true),
            assign(mod_template.id, maker, AssignmentTarget::Item(base_cabinet.id), Some(dec!(35)), true),
        ];
        let found = applicable(&rows, &base_cabinet);

        assert_eq!(unit_price(&mod_template, &found), dec!(35));
        assert_eq!(unit_price(&mod_template, &[]), dec!(40));
    }

    #[rstest]
    fn assignment_without_override_keeps_the_template_price(base_cabinet: CatalogItem) {
        let maker = base_cabinet.manufacturer_id;
        let mod_template = template(Owner::Manufacturer(maker), Some(dec!(40)));
        let rows = vec![assign(mod_template.id, maker, AssignmentTarget::All, None, true)];

        assert_eq!(unit_price(&mod_template, &applicable(&rows, &base_cabinet)), dec!(40));
    }

    #[rstest]
    fn duplicate_names_ignore_case() {
        let blueprint = template(Owner::Gallery, None);
        assert!(blueprint.is_blueprint());
        assert!(blueprint.is_named(" finished END "));
        assert!(!blueprint.is_named("Glass door"));
    }
}
