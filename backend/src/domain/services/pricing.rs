//! Quotes priced from catalog data.
//!
//! The HTTP layer sends catalog item ids, modification template ids and
//! quantities. Prices, assembly costs and both multipliers are looked up
//! here so clients cannot tamper with them.

use std::collections::HashMap;
use std::sync::Arc;

use pagination::{MAX_LIMIT, PageRequest};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::catalog::{CatalogFilter, CatalogItem};
use crate::domain::modification::{Owner, applicable, unit_price};
use crate::domain::ports::{
    CatalogRepository, ManufacturerRepository, ModificationRepository, TaxRepository,
};
use crate::domain::pricing::{
    Multipliers, PricedExtra, Quote, QuoteInput, QuoteLine, StyleComparison, calculate,
    compare_style,
};
use crate::domain::settings::default_tax_rate;
use crate::domain::{Error, Principal};

use super::{found, invalid};

/// One catalog line requested on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteLineRequest {
    pub catalog_item_id: Uuid,
    pub quantity: u32,
    pub include_assembly: bool,
}

/// One modification template requested on a quote.
///
/// With a catalog item the template is priced as assigned to that item;
/// without one the template's own price applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModificationLineRequest {
    pub template_id: Uuid,
    pub catalog_item_id: Option<Uuid>,
    pub quantity: u32,
}

/// Quote request as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteRequest {
    pub manufacturer_id: Uuid,
    pub lines: Vec<QuoteLineRequest>,
    pub custom_items: Vec<PricedExtra>,
    pub modifications: Vec<ModificationLineRequest>,
    pub discount_percent: Decimal,
    /// Falls back to the default tax rate when absent.
    pub tax_percent: Option<Decimal>,
}

#[derive(Clone)]
pub struct PricingService {
    manufacturers: Arc<dyn ManufacturerRepository>,
    catalog: Arc<dyn CatalogRepository>,
    modifications: Arc<dyn ModificationRepository>,
    taxes: Arc<dyn TaxRepository>,
}

impl PricingService {
    pub fn new(
        manufacturers: Arc<dyn ManufacturerRepository>,
        catalog: Arc<dyn CatalogRepository>,
        modifications: Arc<dyn ModificationRepository>,
        taxes: Arc<dyn TaxRepository>,
    ) -> Self {
        Self {
            manufacturers,
            catalog,
            modifications,
            taxes,
        }
    }

    pub async fn quote(&self, principal: &Principal, request: &QuoteRequest) -> Result<Quote, Error> {
        let (input, _) = self.build_input(principal, request).await?;
        calculate(&input).map_err(invalid)
    }

    /// Price the quote, then re-price its cabinets in `alternative_style`.
    ///
    /// Every quoted item code must exist in the alternative style.
    pub async fn compare_style(
        &self,
        principal: &Principal,
        request: &QuoteRequest,
        alternative_style: &str,
    ) -> Result<StyleComparison, Error> {
        let (input, items) = self.build_input(principal, request).await?;
        let quote = calculate(&input).map_err(invalid)?;
        let alternatives = self
            .style_prices(request.manufacturer_id, alternative_style)
            .await?;

        let mut current_base = Decimal::ZERO;
        let mut alternative_base = Decimal::ZERO;
        for line in &request.lines {
            let quantity = Decimal::from(line.quantity);
            let Some(item) = items.get(&line.catalog_item_id) else {
                continue;
            };
            let alternative = alternatives.get(&item.code).ok_or_else(|| {
                Error::invalid_request(format!(
                    "item {} is not offered in style {alternative_style}",
                    item.code
                ))
            })?;
            current_base = line_sum(current_base, item.price, quantity)?;
            alternative_base = line_sum(alternative_base, *alternative, quantity)?;
        }
        compare_style(&quote, &input, current_base, alternative_base).map_err(invalid)
    }

    async fn build_input(
        &self,
        principal: &Principal,
        request: &QuoteRequest,
    ) -> Result<(QuoteInput, HashMap<Uuid, CatalogItem>), Error> {
        let manufacturer = found(
            self.manufacturers.find_by_id(request.manufacturer_id).await?,
            "manufacturer",
        )?;
        let ids: Vec<Uuid> = request.lines.iter().map(|l| l.catalog_item_id).collect();
        let items: HashMap<Uuid, CatalogItem> = self
            .catalog
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .filter(|item| item.manufacturer_id == manufacturer.id)
            .map(|item| (item.id, item))
            .collect();
        let costs: HashMap<_, _> = self.catalog.assembly_costs(&ids).await?.into_iter().collect();

        let lines = request
            .lines
            .iter()
            .map(|line| {
                let item = items.get(&line.catalog_item_id).ok_or_else(|| {
                    Error::invalid_request(format!(
                        "unknown catalog item {}",
                        line.catalog_item_id
                    ))
                })?;
                Ok(QuoteLine {
                    base_price: item.price,
                    quantity: line.quantity,
                    assembly: costs.get(&item.id).copied(),
                    include_assembly: line.include_assembly,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let tax_percent = match request.tax_percent {
            Some(tax) => tax,
            None => default_tax_rate(&self.taxes.list().await?),
        };
        let input = QuoteInput {
            multipliers: Multipliers {
                manufacturer: manufacturer.cost_multiplier,
                group: principal.group_multiplier(),
            },
            lines,
            custom_items: request.custom_items.clone(),
            modifications: self.price_modifications(request, &items).await?,
            discount_percent: request.discount_percent,
            tax_percent,
        };
        Ok((input, items))
    }

    /// Resolve requested templates into priced rows.
    ///
    /// Templates must belong to the quoted manufacturer. A row tied to a
    /// catalog item needs that item on the quote and an assignment offering
    /// the template on it.
    async fn price_modifications(
        &self,
        request: &QuoteRequest,
        items: &HashMap<Uuid, CatalogItem>,
    ) -> Result<Vec<PricedExtra>, Error> {
        if request.modifications.is_empty() {
            return Ok(Vec::new());
        }
        let owner = Owner::Manufacturer(request.manufacturer_id);
        let mut ids: Vec<Uuid> = request.modifications.iter().map(|m| m.template_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let templates: HashMap<Uuid, _> = self
            .modifications
            .find_templates(&ids)
            .await?
            .into_iter()
            .filter(|t| t.owner == owner)
            .map(|t| (t.id, t))
            .collect();
        let assignments = if request.modifications.iter().any(|m| m.catalog_item_id.is_some()) {
            self.modifications
                .list_assignments(request.manufacturer_id)
                .await?
        } else {
            Vec::new()
        };

        request
            .modifications
            .iter()
            .map(|row| {
                let template = templates.get(&row.template_id).ok_or_else(|| {
                    Error::invalid_request(format!(
                        "unknown modification template {}",
                        row.template_id
                    ))
                })?;
                let price = match row.catalog_item_id {
                    None => template.price.unwrap_or(Decimal::ZERO),
                    Some(item_id) => {
                        let item = items.get(&item_id).ok_or_else(|| {
                            Error::invalid_request(format!(
                                "modification refers to catalog item {item_id} which is not on the quote"
                            ))
                        })?;
                        let offered = applicable(&assignments, item);
                        if !offered.iter().any(|a| a.template_id == template.id) {
                            return Err(Error::invalid_request(format!(
                                "{} is not offered on item {}",
                                template.name, item.code
                            )));
                        }
                        unit_price(template, &offered)
                    }
                };
                Ok(PricedExtra {
                    price,
                    quantity: row.quantity,
                })
            })
            .collect()
    }

    /// Base price by item code for every item of one style.
    async fn style_prices(
        &self,
        manufacturer_id: Uuid,
        style: &str,
    ) -> Result<HashMap<String, Decimal>, Error> {
        let filter = CatalogFilter {
            style: Some(style.to_owned()),
            search: None,
        };
        let mut prices = HashMap::new();
        let mut page_number = 1;
        loop {
            let page = PageRequest::new(page_number, MAX_LIMIT).map_err(invalid)?;
            let batch = self.catalog.list(manufacturer_id, &filter, page).await?;
            let total_pages = batch.pagination.total_pages;
            prices.extend(batch.items.into_iter().map(|item| (item.code, item.price)));
            if u64::from(page_number) >= total_pages {
                break;
            }
            page_number += 1;
        }
        Ok(prices)
    }
}

/// `total + price × quantity`, refusing amounts outside the decimal range.
fn line_sum(total: Decimal, price: Decimal, quantity: Decimal) -> Result<Decimal, Error> {
    price
        .checked_mul(quantity)
        .and_then(|line| total.checked_add(line))
        .ok_or_else(|| Error::invalid_request("quote amounts are too large to price"))
}

#[cfg(test)]
mod tests {
    //! Quotes assembled from mocked catalog data.
    use super::*;
    use crate::domain::access::fixtures;
    use crate::domain::catalog::{AssemblyCost, AssemblyCostKind};
    use crate::domain::manufacturer::Manufacturer;
    use crate::domain::modification::{
        AssignmentTarget, ModificationAssignment, ModificationTemplate,
    };
    use crate::domain::permissions::ModuleAccess;
    use crate::domain::ports::{
        MockCatalogRepository, MockManufacturerRepository, MockModificationRepository,
        MockTaxRepository,
    };
    use crate::domain::services::fixtures::fixed_now;
    use crate::domain::user_group::GroupMultiplier;
    use crate::domain::ErrorCode;
    use pagination::Paginated;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn manufacturer() -> Manufacturer {
        Manufacturer {
            id: Uuid::new_v4(),
            name: "Northwood".to_owned(),
            email: None,
            phone: None,
            address: None,
            website: None,
            is_active: true,
            cost_multiplier: dec!(1.5),
            instructions: None,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn item(manufacturer_id: Uuid, code: &str, style: &str, price: Decimal) -> CatalogItem {
        CatalogItem {
            id: Uuid::new_v4(),
            manufacturer_id,
            code: code.to_owned(),
            description: None,
            style: style.to_owned(),
            item_type: None,
            price,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn contractor_with_multiplier() -> Principal {
        let mut principal = fixtures::contractor(ModuleAccess::all());
        if let Some(group) = principal.group.as_mut() {
            group.multiplier = GroupMultiplier::try_new(dec!(1.2), true).expect("multiplier");
        }
        principal
    }

    fn mocks(
        manufacturer: Manufacturer,
        stored: CatalogItem,
        cost: Option<AssemblyCost>,
    ) -> (MockManufacturerRepository, MockCatalogRepository) {
        let mut manufacturers = MockManufacturerRepository::new();
        manufacturers
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(manufacturer)));
        let mut catalog = MockCatalogRepository::new();
        let item_id = stored.id;
        catalog
            .expect_find_by_ids()
            .return_once(move |_| Ok(vec![stored]));
        catalog
            .expect_assembly_costs()
            .return_once(move |_| Ok(cost.map(|c| vec![(item_id, c)]).unwrap_or_default()));
        (manufacturers, catalog)
    }

    #[rstest]
    #[case::no_assembly(None, dec!(180))]
    #[case::percentage(Some(AssemblyCost { kind: AssemblyCostKind::Percentage, amount: dec!(10) }), dec!(198))]
    #[case::flat(Some(AssemblyCost { kind: AssemblyCostKind::Flat, amount: dec!(25) }), dec!(205))]
    #[tokio::test]
    async fn quotes_apply_both_multipliers(
        manufacturer: Manufacturer,
        #[case] cost: Option<AssemblyCost>,
        #[case] expected: Decimal,
    ) {
        let stored = item(manufacturer.id, "B12", "Shaker", dec!(100));
        let request = QuoteRequest {
            manufacturer_id: manufacturer.id,
            lines: vec![QuoteLineRequest {
                catalog_item_id: stored.id,
                quantity: 1,
                include_assembly: true,
            }],
            tax_percent: Some(Decimal::ZERO),
            ..QuoteRequest::default()
        };
        let (manufacturers, catalog) = mocks(manufacturer, stored, cost);
        let service = PricingService::new(
            Arc::new(manufacturers),
            Arc::new(catalog),
            Arc::new(MockModificationRepository::new()),
            Arc::new(MockTaxRepository::new()),
        );

        let quote = service
            .quote(&contractor_with_multiplier(), &request)
            .await
            .expect("quote");
        assert_eq!(quote.grand_total, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn items_of_other_manufacturers_are_rejected(manufacturer: Manufacturer) {
        let foreign = item(Uuid::new_v4(), "B12", "Shaker", dec!(100));
        let request = QuoteRequest {
            manufacturer_id: manufacturer.id,
            lines: vec![QuoteLineRequest {
                catalog_item_id: foreign.id,
                quantity: 1,
                include_assembly: false,
            }],
            tax_percent: Some(Decimal::ZERO),
            ..QuoteRequest::default()
        };
        let (manufacturers, catalog) = mocks(manufacturer, foreign, None);
        let service = PricingService::new(
            Arc::new(manufacturers),
            Arc::new(catalog),
            Arc::new(MockModificationRepository::new()),
            Arc::new(MockTaxRepository::new()),
        );

        let err = service
            .quote(&fixtures::admin(), &request)
            .await
            .expect_err("foreign item");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn style_comparison_uses_alternative_prices(manufacturer: Manufacturer) {
        let manufacturer_id = manufacturer.id;
        let stored = item(manufacturer_id, "B12", "Shaker", dec!(100));
        let alternative = item(manufacturer_id, "B12", "Slab", dec!(120));
        let request = QuoteRequest {
            manufacturer_id,
            lines: vec![QuoteLineRequest {
                catalog_item_id: stored.id,
                quantity: 2,
                include_assembly: false,
            }],
            tax_percent: Some(Decimal::ZERO),
            ..QuoteRequest::default()
        };
        let (manufacturers, mut catalog) = mocks(manufacturer, stored, None);
        catalog.expect_list().return_once(move |_, _, page| {
            Ok(Paginated::new(vec![alternative], page, 1))
        });
        let service = PricingService::new(
            Arc::new(manufacturers),
            Arc::new(catalog),
            Arc::new(MockModificationRepository::new()),
            Arc::new(MockTaxRepository::new()),
        );

        let comparison = service
            .compare_style(&fixtures::admin(), &request, "Slab")
            .await
            .expect("comparison");
        // (240 - 200) × 1.5
        assert_eq!(comparison.delta, dec!(60));
        assert_eq!(comparison.grand_total, dec!(360));
    }

    fn finished_end(owner: Owner, price: Decimal) -> ModificationTemplate {
        ModificationTemplate {
            id: Uuid::new_v4(),
            category_id: None,
            name: "Finished end".to_owned(),
            owner,
            price: Some(price),
            is_ready: true,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn item_modifications_use_the_assigned_price(manufacturer: Manufacturer) {
        let maker = manufacturer.id;
        let stored = item(maker, "B12", "Shaker", dec!(100));
        let template = finished_end(Owner::Manufacturer(maker), dec!(40));
        let assignment = ModificationAssignment {
            id: Uuid::new_v4(),
            template_id: template.id,
            manufacturer_id: maker,
            target: AssignmentTarget::Item(stored.id),
            override_price: Some(dec!(30)),
            is_active: true,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        };
        let request = QuoteRequest {
            manufacturer_id: maker,
            lines: vec![QuoteLineRequest {
                catalog_item_id: stored.id,
                quantity: 1,
                include_assembly: false,
            }],
            modifications: vec![ModificationLineRequest {
                template_id: template.id,
                catalog_item_id: Some(stored.id),
                quantity: 2,
            }],
            tax_percent: Some(Decimal::ZERO),
            ..QuoteRequest::default()
        };
        let (manufacturers, catalog) = mocks(manufacturer, stored, None);
        let mut modifications = MockModificationRepository::new();
        modifications
            .expect_find_templates()
            .return_once(move |_| Ok(vec![template]));
        modifications
            .expect_list_assignments()
            .return_once(move |_| Ok(vec![assignment]));
        let service = PricingService::new(
            Arc::new(manufacturers),
            Arc::new(catalog),
            Arc::new(modifications),
            Arc::new(MockTaxRepository::new()),
        );

        let quote = service
            .quote(&fixtures::admin(), &request)
            .await
            .expect("quote");

        // 100 × 1.5 + 2 × 30
        assert_eq!(quote.grand_total, dec!(210));
    }

    #[rstest]
    #[case::other_manufacturer(false)]
    #[case::not_assigned(true)]
    #[tokio::test]
    async fn unoffered_modifications_are_rejected(manufacturer: Manufacturer, #[case] own: bool) {
        let maker = manufacturer.id;
        let stored = item(maker, "B12", "Shaker", dec!(100));
        let owner = if own { Owner::Manufacturer(maker) } else { Owner::Manufacturer(Uuid::new_v4()) };
        let template = finished_end(owner, dec!(40));
        let request = QuoteRequest {
            manufacturer_id: maker,
            lines: vec![QuoteLineRequest {
                catalog_item_id: stored.id,
                quantity: 1,
                include_assembly: false,
            }],
            modifications: vec![ModificationLineRequest {
                template_id: template.id,
                catalog_item_id: Some(stored.id),
                quantity: 1,
            }],
            tax_percent: Some(Decimal::ZERO),
            ..QuoteRequest::default()
        };
        let (manufacturers, catalog) = mocks(manufacturer, stored, None);
        let mut modifications = MockModificationRepository::new();
        modifications
            .expect_find_templates()
            .return_once(move |_| Ok(vec![template]));
        modifications
            .expect_list_assignments()
            .returning(|_| Ok(Vec::new()));
        let service = PricingService::new(
            Arc::new(manufacturers),
            Arc::new(catalog),
            Arc::new(modifications),
            Arc::new(MockTaxRepository::new()),
        );

        let err = service
            .quote(&fixtures::admin(), &request)
            .await
            .expect_err("modification not offered");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn style_sums_refuse_to_overflow() {
        let err = line_sum(Decimal::MAX, dec!(1), dec!(1)).expect_err("overflow");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(line_sum(dec!(10), dec!(2.5), dec!(4)).expect("sum"), dec!(20));
    }
}
