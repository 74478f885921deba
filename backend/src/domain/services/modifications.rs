//! Modification gallery, manufacturer templates and their assignments.

use std::sync::Arc;

use mockable::Clock;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::domain::modification::{
    AssignmentDraft, AssignmentTarget, CategoryDeleteMode, CategoryDraft, ModificationAssignment,
    ModificationCategory, ModificationTemplate, Owner, TemplateDraft, applicable, unit_price,
};
use crate::domain::ports::{CatalogRepository, ManufacturerRepository, ModificationRepository};
use crate::domain::{Error, Permission, Principal};

use super::{found, invalid};

/// Copy request for a gallery blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintCopy {
    pub manufacturer_id: Uuid,
    /// Manufacturer category to file the copy under. When absent the
    /// blueprint's category name is looked up or created for the
    /// manufacturer.
    pub category_id: Option<Uuid>,
    pub allow_duplicate: bool,
}

/// A template offered on one catalog item at its effective price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemModification {
    pub template: ModificationTemplate,
    pub unit_price: Decimal,
}

/// Reads are open to every signed-in user; writes need
/// `admin:manufacturers`.
#[derive(Clone)]
pub struct ModificationService {
    modifications: Arc<dyn ModificationRepository>,
    manufacturers: Arc<dyn ManufacturerRepository>,
    catalog: Arc<dyn CatalogRepository>,
    clock: Arc<dyn Clock>,
}

impl ModificationService {
    pub fn new(
        modifications: Arc<dyn ModificationRepository>,
        manufacturers: Arc<dyn ManufacturerRepository>,
        catalog: Arc<dyn CatalogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            modifications,
            manufacturers,
            catalog,
            clock,
        }
    }

    async fn ensure_owner(&self, owner: Owner) -> Result<(), Error> {
        if let Owner::Manufacturer(id) = owner {
            found(self.manufacturers.find_by_id(id).await?, "manufacturer")?;
        }
        Ok(())
    }

    async fn category(&self, id: Uuid) -> Result<ModificationCategory, Error> {
        found(
            self.modifications.find_category(id).await?,
            "modification category",
        )
    }

    async fn template(&self, id: Uuid) -> Result<ModificationTemplate, Error> {
        found(
            self.modifications.find_template(id).await?,
            "modification template",
        )
    }

    /// Reject a category reference that belongs to another owner.
    async fn check_category(&self, category_id: Option<Uuid>, owner: Owner) -> Result<(), Error> {
        let Some(id) = category_id else {
            return Ok(());
        };
        let category = self
            .modifications
            .find_category(id)
            .await?
            .ok_or_else(|| Error::invalid_request("modification category not found"))?;
        if category.owner != owner {
            return Err(Error::invalid_request(
                "category belongs to a different gallery or manufacturer",
            ));
        }
        Ok(())
    }

    pub async fn categories(&self, owner: Owner) -> Result<Vec<ModificationCategory>, Error> {
        self.ensure_owner(owner).await?;
        Ok(self.modifications.list_categories(owner).await?)
    }

    pub async fn create_category(
        &self,
        principal: &Principal,
        owner: Owner,
        draft: CategoryDraft,
    ) -> Result<ModificationCategory, Error> {
        principal.require(Permission::AdminManufacturers)?;
        self.ensure_owner(owner).await?;
        let now = self.clock.utc();
        let category = ModificationCategory {
            id: Uuid::new_v4(),
            name: draft.name,
            owner,
            order_index: draft.order_index,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        self.modifications.insert_category(&category).await?;
        info!(category_id = %category.id, "modification category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: CategoryDraft,
    ) -> Result<ModificationCategory, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let mut category = self.category(id).await?;
        category.name = draft.name;
        category.order_index = draft.order_index;
        category.description = draft.description;
        category.updated_at = self.clock.utc();
        self.modifications.update_category(&category).await?;
        Ok(category)
    }

    /// Delete a category, handling its templates according to `mode`.
    ///
    /// A move target must be another category of the same owner.
    pub async fn delete_category(
        &self,
        principal: &Principal,
        id: Uuid,
        mode: CategoryDeleteMode,
    ) -> Result<(), Error> {
        principal.require(Permission::AdminManufacturers)?;
        let category = self.category(id).await?;
        if let CategoryDeleteMode::MoveTo(target) = mode {
            if target == id {
                return Err(Error::invalid_request(
                    "cannot move modifications into the category being deleted",
                ));
            }
            let target = self
                .modifications
                .find_category(target)
                .await?
                .ok_or_else(|| Error::invalid_request("target category not found"))?;
            if target.owner != category.owner {
                return Err(Error::invalid_request(
                    "target category must have the same scope and manufacturer",
                ));
            }
        }
        if !self.modifications.delete_category(id, mode).await? {
            return Err(Error::not_found("modification category not found"));
        }
        info!(category_id = %id, ?mode, "modification category deleted");
        Ok(())
    }

    pub async fn templates(&self, owner: Owner) -> Result<Vec<ModificationTemplate>, Error> {
        self.ensure_owner(owner).await?;
        Ok(self.modifications.list_templates(owner).await?)
    }

    /// Create a blueprint (gallery) or a priced manufacturer template.
    pub async fn create_template(
        &self,
        principal: &Principal,
        owner: Owner,
        draft: TemplateDraft,
    ) -> Result<ModificationTemplate, Error> {
        principal.require(Permission::AdminManufacturers)?;
        self.ensure_owner(owner).await?;
        let price = owner.template_price(draft.price).map_err(invalid)?;
        self.check_category(draft.category_id, owner).await?;
        let now = self.clock.utc();
        let template = ModificationTemplate {
            id: Uuid::new_v4(),
            category_id: draft.category_id,
            name: draft.name,
            owner,
            price,
            is_ready: draft.is_ready,
            created_at: now,
            updated_at: now,
        };
        self.modifications.insert_template(&template).await?;
        info!(template_id = %template.id, blueprint = template.is_blueprint(), "modification template created");
        Ok(template)
    }

    /// Edit a template. Its owner never changes.
    pub async fn update_template(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: TemplateDraft,
    ) -> Result<ModificationTemplate, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let mut template = self.template(id).await?;
        let price = template.owner.template_price(draft.price).map_err(invalid)?;
        self.check_category(draft.category_id, template.owner).await?;
        template.category_id = draft.category_id;
        template.name = draft.name;
        template.price = price;
        template.is_ready = draft.is_ready;
        template.updated_at = self.clock.utc();
        self.modifications.update_template(&template).await?;
        Ok(template)
    }

    pub async fn delete_template(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::AdminManufacturers)?;
        if !self.modifications.delete_template(id).await? {
            return Err(Error::not_found("modification template not found"));
        }
        info!(template_id = %id, "modification template deleted");
        Ok(())
    }

    /// Copy a gallery blueprint into a manufacturer's templates.
    ///
    /// The copy starts at price zero and not ready. A name already used by
    /// the manufacturer is a conflict unless duplicates are allowed.
    pub async fn use_blueprint(
        &self,
        principal: &Principal,
        blueprint_id: Uuid,
        copy: BlueprintCopy,
    ) -> Result<ModificationTemplate, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let blueprint = self
            .modifications
            .find_template(blueprint_id)
            .await?
            .filter(ModificationTemplate::is_blueprint)
            .ok_or_else(|| Error::not_found("blueprint not found"))?;
        let owner = Owner::Manufacturer(copy.manufacturer_id);
        self.ensure_owner(owner).await?;
        if !copy.allow_duplicate {
            let existing = self.modifications.list_templates(owner).await?;
            if let Some(clash) = existing.iter().find(|t| t.is_named(&blueprint.name)) {
                return Err(Error::conflict(format!(
                    "manufacturer already has a modification named {}",
                    clash.name
                ))
                .with_details(serde_json::json!({ "duplicate": true, "existingId": clash.id })));
            }
        }
        let category_id = match copy.category_id {
            Some(id) => {
                self.check_category(Some(id), owner).await?;
                Some(id)
            }
            None => self.mirror_category(blueprint.category_id, owner).await?,
        };
        let now = self.clock.utc();
        let template = ModificationTemplate {
            id: Uuid::new_v4(),
            category_id,
            name: blueprint.name.clone(),
            owner,
            price: Some(Decimal::ZERO),
            is_ready: false,
            created_at: now,
            updated_at: now,
        };
        self.modifications.insert_template(&template).await?;
        info!(
            blueprint_id = %blueprint.id,
            template_id = %template.id,
            manufacturer_id = %copy.manufacturer_id,
            "blueprint copied"
        );
        Ok(template)
    }

    /// The manufacturer category named like the gallery one, created when
    /// missing.
    async fn mirror_category(
        &self,
        gallery_category: Option<Uuid>,
        owner: Owner,
    ) -> Result<Option<Uuid>, Error> {
        let Some(source) = gallery_category else {
            return Ok(None);
        };
        let Some(source) = self.modifications.find_category(source).await? else {
            return Ok(None);
        };
        let existing = self.modifications.list_categories(owner).await?;
        if let Some(same) = existing
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&source.name))
        {
            return Ok(Some(same.id));
        }
        let now = self.clock.utc();
        let category = ModificationCategory {
            id: Uuid::new_v4(),
            name: source.name,
            owner,
            order_index: 0,
            description: source.description,
            created_at: now,
            updated_at: now,
        };
        self.modifications.insert_category(&category).await?;
        Ok(Some(category.id))
    }

    pub async fn assignments(
        &self,
        manufacturer_id: Uuid,
    ) -> Result<Vec<ModificationAssignment>, Error> {
        self.ensure_owner(Owner::Manufacturer(manufacturer_id)).await?;
        Ok(self.modifications.list_assignments(manufacturer_id).await?)
    }

    /// Assign one of the manufacturer's own templates to some of its items.
    pub async fn create_assignment(
        &self,
        principal: &Principal,
        manufacturer_id: Uuid,
        draft: AssignmentDraft,
    ) -> Result<ModificationAssignment, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let owner = Owner::Manufacturer(manufacturer_id);
        self.ensure_owner(owner).await?;
        let template = self
            .modifications
            .find_template(draft.template_id)
            .await?
            .ok_or_else(|| Error::invalid_request("modification template not found"))?;
        if template.owner != owner {
            return Err(Error::invalid_request(
                "only the manufacturer's own modifications can be assigned",
            ));
        }
        if let AssignmentTarget::Item(item_id) = draft.target {
            let item = self.catalog.find_by_id(item_id).await?;
            if item.is_none_or(|item| item.manufacturer_id != manufacturer_id) {
                return Err(Error::invalid_request(
                    "catalog item does not belong to the manufacturer",
                ));
            }
        }
        let now = self.clock.utc();
        let assignment = ModificationAssignment {
            id: Uuid::new_v4(),
            template_id: draft.template_id,
            manufacturer_id,
            target: draft.target,
            override_price: draft.override_price,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };
        self.modifications.insert_assignment(&assignment).await?;
        info!(assignment_id = %assignment.id, scope = assignment.target.scope(), "modification assigned");
        Ok(assignment)
    }

    pub async fn delete_assignment(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::AdminManufacturers)?;
        if !self.modifications.delete_assignment(id).await? {
            return Err(Error::not_found("modification assignment not found"));
        }
        Ok(())
    }

    /// Templates offered on a catalog item, each at its effective price,
    /// ordered by name.
    pub async fn for_item(&self, catalog_item_id: Uuid) -> Result<Vec<ItemModification>, Error> {
        let item = found(
            self.catalog.find_by_id(catalog_item_id).await?,
            "catalog item",
        )?;
        let assignments = self
            .modifications
            .list_assignments(item.manufacturer_id)
            .await?;
        let offered = applicable(&assignments, &item);
        let mut ids: Vec<Uuid> = offered.iter().map(|a| a.template_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let mut rows: Vec<ItemModification> = self
            .modifications
            .find_templates(&ids)
            .await?
            .into_iter()
            .map(|template| ItemModification {
                unit_price: unit_price(&template, &offered),
                template,
            })
            .collect();
        rows.sort_by(|a, b| a.template.name.cmp(&b.template.name));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::fixtures;
    use crate::domain::catalog::CatalogItem;
    use crate::domain::manufacturer::Manufacturer;
    use crate::domain::ports::{
        MockCatalogRepository, MockManufacturerRepository, MockModificationRepository,
        ModificationPersistenceError,
    };
    use crate::domain::services::fixtures::{clock, fixed_now};
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    struct Mocks {
        modifications: MockModificationRepository,
        manufacturers: MockManufacturerRepository,
        catalog: MockCatalogRepository,
    }

    impl Mocks {
        fn service(self) -> ModificationService {
            ModificationService::new(
                Arc::new(self.modifications),
                Arc::new(self.manufacturers),
                Arc::new(self.catalog),
                clock(),
            )
        }
    }

    #[fixture]
    fn mocks() -> Mocks {
        Mocks {
            modifications: MockModificationRepository::new(),
            manufacturers: MockManufacturerRepository::new(),
            catalog: MockCatalogRepository::new(),
        }
    }

    fn manufacturer(id: Uuid) -> Manufacturer {
        Manufacturer {
            id,
            name: "Northwood".to_owned(),
            email: None,
            phone: None,
            address: None,
            website: None,
            is_active: true,
            cost_multiplier: dec!(1),
            instructions: None,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn template(owner: Owner, name: &str, price: Option<Decimal>) -> ModificationTemplate {
        ModificationTemplate {
            id: Uuid::new_v4(),
            category_id: None,
            name: name.to_owned(),
            owner,
            price,
            is_ready: true,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn category(owner: Owner, name: &str) -> ModificationCategory {
        ModificationCategory {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            owner,
            order_index: 0,
            description: None,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn known_manufacturer(mocks: &mut Mocks, id: Uuid) {
        mocks
            .manufacturers
            .expect_find_by_id()
            .returning(move |_| Ok(Some(manufacturer(id))));
    }

    #[rstest]
    #[tokio::test]
    async fn writes_need_manufacturer_admin(mocks: Mocks) {
        let draft = CategoryDraft::try_new("Doors", 0, None).expect("draft");

        let err = mocks
            .service()
            .create_category(&fixtures::standard(), Owner::Gallery, draft)
            .await
            .expect_err("only manufacturer admins edit the gallery");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case::blueprint_with_price(Owner::Gallery, Some(dec!(10)), None)]
    #[case::manufacturer_default(Owner::Manufacturer(Uuid::nil()), None, Some(Decimal::ZERO))]
    #[tokio::test]
    async fn template_prices_follow_their_owner(
        mut mocks: Mocks,
        #[case] owner: Owner,
        #[case] requested: Option<Decimal>,
        #[case] stored: Option<Decimal>,
    ) {
        known_manufacturer(&mut mocks, Uuid::nil());
        let accepted = stored.is_some();
        mocks
            .modifications
            .expect_insert_template()
            .withf(move |t| t.price == stored)
            .times(usize::from(accepted))
            .returning(|_| Ok(()));
        let draft = TemplateDraft::try_new("Finished end", None, requested, true).expect("draft");

        let result = mocks
            .service()
            .create_template(&fixtures::admin(), owner, draft)
            .await;

        match result {
            Ok(template) => assert_eq!(template.price, stored),
            Err(err) => {
                assert!(!accepted);
                assert_eq!(err.code(), ErrorCode::InvalidRequest);
            }
        }
    }

    #[rstest]
    #[tokio::test]
    async fn templates_cannot_borrow_another_owners_category(mut mocks: Mocks) {
        let maker = Uuid::new_v4();
        known_manufacturer(&mut mocks, maker);
        let gallery = category(Owner::Gallery, "Doors");
        let gallery_id = gallery.id;
        mocks
            .modifications
            .expect_find_category()
            .return_once(move |_| Ok(Some(gallery)));
        mocks.modifications.expect_insert_template().never();
        let draft =
            TemplateDraft::try_new("Glass insert", Some(gallery_id), Some(dec!(85)), true).expect("draft");

        let err = mocks
            .service()
            .create_template(&fixtures::admin(), Owner::Manufacturer(maker), draft)
            .await
            .expect_err("foreign category");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn moving_requires_a_category_of_the_same_owner(mut mocks: Mocks) {
        let doomed = category(Owner::Manufacturer(Uuid::new_v4()), "Doors");
        let other = category(Owner::Manufacturer(Uuid::new_v4()), "Doors");
        let (doomed_id, other_id) = (doomed.id, other.id);
        mocks
            .modifications
            .expect_find_category()
            .returning(move |id| {
                Ok(if id == doomed_id {
                    Some(doomed.clone())
                } else {
                    Some(other.clone())
                })
            });
        mocks.modifications.expect_delete_category().never();

        let err = mocks
            .service()
            .delete_category(&fixtures::admin(), doomed_id, CategoryDeleteMode::MoveTo(other_id))
            .await
            .expect_err("different manufacturer");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn occupied_category_is_reported_as_invalid(mut mocks: Mocks) {
        let doors = category(Owner::Gallery, "Doors");
        let id = doors.id;
        mocks
            .modifications
            .expect_find_category()
            .return_once(move |_| Ok(Some(doors)));
        mocks
            .modifications
            .expect_delete_category()
            .return_once(move |_, _| Err(ModificationPersistenceError::category_not_empty(id)));

        let err = mocks
            .service()
            .delete_category(&fixtures::admin(), id, CategoryDeleteMode::Only)
            .await
            .expect_err("category holds templates");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn copying_a_blueprint_refuses_duplicate_names(mut mocks: Mocks) {
        let maker = Uuid::new_v4();
        known_manufacturer(&mut mocks, maker);
        let blueprint = template(Owner::Gallery, "Finished end", None);
        let blueprint_id = blueprint.id;
        let existing = template(Owner::Manufacturer(maker), "FINISHED END", Some(dec!(20)));
        mocks
            .modifications
            .expect_find_template()
            .return_once(move |_| Ok(Some(blueprint)));
        mocks
            .modifications
            .expect_list_templates()
            .return_once(move |_| Ok(vec![existing]));
        mocks.modifications.expect_insert_template().never();
        let copy = BlueprintCopy {
            manufacturer_id: maker,
            category_id: None,
            allow_duplicate: false,
        };

        let err = mocks
            .service()
            .use_blueprint(&fixtures::admin(), blueprint_id, copy)
            .await
            .expect_err("duplicate name");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn copied_blueprint_lands_in_a_matching_manufacturer_category(mut mocks: Mocks) {
        let maker = Uuid::new_v4();
        known_manufacturer(&mut mocks, maker);
        let gallery_doors = category(Owner::Gallery, "Doors");
        let mut blueprint = template(Owner::Gallery, "Glass insert", None);
        blueprint.category_id = Some(gallery_doors.id);
        let blueprint_id = blueprint.id;
        let own_doors = category(Owner::Manufacturer(maker), "doors");
        let own_doors_id = own_doors.id;
        mocks
            .modifications
            .expect_find_template()
            .return_once(move |_| Ok(Some(blueprint)));
        mocks
            .modifications
            .expect_find_category()
            .return_once(move |_| Ok(Some(gallery_doors)));
        mocks
            .modifications
            .expect_list_categories()
            .return_once(move |_| Ok(vec![own_doors]));
        mocks.modifications.expect_insert_category().never();
        mocks
            .modifications
            .expect_insert_template()
            .withf(move |t| {
                t.category_id == Some(own_doors_id)
                    && t.owner == Owner::Manufacturer(maker)
                    && t.price == Some(Decimal::ZERO)
                    && !t.is_ready
            })
            .return_once(|_| Ok(()));
        let copy = BlueprintCopy {
            manufacturer_id: maker,
            category_id: None,
            allow_duplicate: true,
        };

        let copied = mocks
            .service()
            .use_blueprint(&fixtures::admin(), blueprint_id, copy)
            .await
            .expect("copied");

        assert_eq!(copied.name, "Glass insert");
    }

    #[rstest]
    #[tokio::test]
    async fn manufacturer_templates_are_not_blueprints(mut mocks: Mocks) {
        let owned = template(Owner::Manufacturer(Uuid::new_v4()), "Finished end", Some(dec!(5)));
        let id = owned.id;
        mocks
            .modifications
            .expect_find_template()
            .return_once(move |_| Ok(Some(owned)));
        let copy = BlueprintCopy {
            manufacturer_id: Uuid::new_v4(),
            category_id: None,
            allow_duplicate: true,
        };

        let err = mocks
            .service()
            .use_blueprint(&fixtures::admin(), id, copy)
            .await
            .expect_err("not a blueprint");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn assignments_use_the_manufacturers_own_templates(mut mocks: Mocks) {
        let maker = Uuid::new_v4();
        known_manufacturer(&mut mocks, maker);
        let foreign = template(Owner::Manufacturer(Uuid::new_v4()), "Finished end", Some(dec!(5)));
        let foreign_id = foreign.id;
        mocks
            .modifications
            .expect_find_template()
            .return_once(move |_| Ok(Some(foreign)));
        mocks.modifications.expect_insert_assignment().never();
        let draft = AssignmentDraft::try_new(foreign_id, AssignmentTarget::All, None, true)
            .expect("draft");

        let err = mocks
            .service()
            .create_assignment(&fixtures::admin(), maker, draft)
            .await
            .expect_err("foreign template");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn item_offers_use_override_prices(mut mocks: Mocks) {
        let maker = Uuid::new_v4();
        let item = CatalogItem {
            id: Uuid::new_v4(),
            manufacturer_id: maker,
            code: "B24".to_owned(),
            description: None,
            style: "Shaker".to_owned(),
            item_type: None,
            price: dec!(310),
            created_at: fixed_now(),
            updated_at: fixed_now(),
        };
        let item_id = item.id;
        let tray = template(Owner::Manufacturer(maker), "Roll-out tray", Some(dec!(120)));
        let end = template(Owner::Manufacturer(maker), "Finished end", Some(dec!(40)));
        let assignments = vec![
            ModificationAssignment {
                id: Uuid::new_v4(),
                template_id: tray.id,
                manufacturer_id: maker,
                target: AssignmentTarget::Style("Shaker".to_owned()),
                override_price: Some(dec!(95)),
                is_active: true,
                created_at: fixed_now(),
                updated_at: fixed_now(),
            },
            ModificationAssignment {
                id: Uuid::new_v4(),
                template_id: end.id,
                manufacturer_id: maker,
                target: AssignmentTarget::All,
                override_price: None,
                is_active: true,
                created_at: fixed_now(),
                updated_at: fixed_now(),
            },
        ];
        mocks
            .catalog
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(item)));
        mocks
            .modifications
            .expect_list_assignments()
            .return_once(move |_| Ok(assignments));
        mocks
            .modifications
            .expect_find_templates()
            .return_once(move |_| Ok(vec![tray, end]));

        let offers = mocks.service().for_item(item_id).await.expect("offers");

        let priced: Vec<(&str, Decimal)> = offers
            .iter()
            .map(|o| (o.template.name.as_str(), o.unit_price))
            .collect();
        assert_eq!(priced, vec![("Finished end", dec!(40)), ("Roll-out tray", dec!(95))]);
    }
}
