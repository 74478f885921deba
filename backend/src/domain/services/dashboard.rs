//! Dashboard figures over the proposals and orders a principal can see.
//!
//! Gated by the dashboard module (`contractors:read`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::dashboard::{
    Counts, DashboardSummary, SUMMARY_WINDOW_DAYS, Totals, build_summary,
};
use crate::domain::order::OrderFilter;
use crate::domain::ports::{OrderRepository, ProposalRepository};
use crate::domain::proposal::{Proposal, ProposalFilter, StatusSet};
use crate::domain::{Error, Permission, Principal};

use super::CustomerService;

/// Proposals returned by the latest-proposals widget.
pub const LATEST_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct DashboardService {
    proposals: Arc<dyn ProposalRepository>,
    orders: Arc<dyn OrderRepository>,
    customers: CustomerService,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(
        proposals: Arc<dyn ProposalRepository>,
        orders: Arc<dyn OrderRepository>,
        customers: CustomerService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            proposals,
            orders,
            customers,
            clock,
        }
    }

    pub async fn counts(&self, principal: &Principal) -> Result<Counts, Error> {
        principal.require(Permission::ContractorsRead)?;
        self.count_active(principal.scope.group_filter()).await
    }

    /// Most recently updated proposals, newest first.
    pub async fn latest(&self, principal: &Principal) -> Result<Vec<Proposal>, Error> {
        principal.require(Permission::ContractorsRead)?;
        let filter = ProposalFilter {
            group_id: principal.scope.group_filter(),
            ..ProposalFilter::default()
        };
        Ok(self.proposals.latest(&filter, LATEST_LIMIT).await?)
    }

    /// Headline totals are counted in the repositories; trends, pipeline and
    /// tasks come from the records of the last [`SUMMARY_WINDOW_DAYS`].
    pub async fn summary(&self, principal: &Principal) -> Result<DashboardSummary, Error> {
        principal.require(Permission::ContractorsRead)?;
        let group_id = principal.scope.group_filter();
        let now = self.clock.utc();
        let since = now - Duration::days(SUMMARY_WINDOW_DAYS);
        let counts = self.count_active(group_id).await?;
        let awaiting_approvals = self
            .proposals
            .count(&ProposalFilter {
                group_id,
                status_set: Some(StatusSet::AwaitingApproval),
                ..ProposalFilter::default()
            })
            .await?;
        let proposals = self
            .proposals
            .list_all(&ProposalFilter {
                group_id,
                updated_since: Some(since),
                ..ProposalFilter::default()
            })
            .await?;
        let orders = self
            .orders
            .list_all(&OrderFilter {
                group_id,
                created_since: Some(since),
                ..OrderFilter::default()
            })
            .await?;

        let mut customer_ids: Vec<Uuid> = proposals.iter().filter_map(|p| p.customer_id).collect();
        customer_ids.sort_unstable();
        customer_ids.dedup();
        let names: HashMap<Uuid, String> =
            self.customers.names(&customer_ids).await?.into_iter().collect();
        let lookup = |p: &Proposal| p.customer_id.and_then(|id| names.get(&id).cloned());
        let totals = Totals {
            counts,
            awaiting_approvals,
        };
        Ok(build_summary(&proposals, &orders, totals, &lookup, now))
    }

    async fn count_active(&self, group_id: Option<Uuid>) -> Result<Counts, Error> {
        let active_proposals = self
            .proposals
            .count(&ProposalFilter {
                group_id,
                status_set: Some(StatusSet::Active),
                ..ProposalFilter::default()
            })
            .await?;
        let active_orders = self
            .orders
            .count(&OrderFilter {
                group_id,
                ..OrderFilter::default()
            })
            .await?;
        Ok(Counts {
            active_proposals,
            active_orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::fixtures;
    use crate::domain::permissions::ModuleAccess;
    use crate::domain::ports::{MockCustomerRepository, MockOrderRepository, MockProposalRepository};
    use crate::domain::proposal::{ProposalStatus, sample};
    use crate::domain::services::fixtures::{clock, fixed_now};
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn service(
        proposals: MockProposalRepository,
        orders: MockOrderRepository,
        customers: MockCustomerRepository,
    ) -> DashboardService {
        let clock = clock();
        DashboardService::new(
            Arc::new(proposals),
            Arc::new(orders),
            CustomerService::new(Arc::new(customers), clock.clone()),
            clock,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn counts_are_scoped_to_contractor_group() {
        let principal = fixtures::contractor(ModuleAccess::all());
        let own = principal.scope.group_filter();
        let mut proposals = MockProposalRepository::new();
        proposals
            .expect_count()
            .withf(move |f| f.group_id == own && f.status_set == Some(StatusSet::Active))
            .return_once(|_| Ok(2));
        proposals.expect_list_all().never();
        let mut orders = MockOrderRepository::new();
        orders
            .expect_count()
            .withf(move |f| f.group_id == own)
            .return_once(|_| Ok(0));
        orders.expect_list_all().never();

        let counts = service(proposals, orders, MockCustomerRepository::new())
            .counts(&principal)
            .await
            .expect("counts");
        assert_eq!(counts.active_proposals, 2);
        assert_eq!(counts.active_orders, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn latest_requests_ten() {
        let mut proposals = MockProposalRepository::new();
        proposals
            .expect_latest()
            .withf(|_, limit| *limit == LATEST_LIMIT)
            .return_once(|_, _| Ok(Vec::new()));

        service(proposals, MockOrderRepository::new(), MockCustomerRepository::new())
            .latest(&fixtures::admin())
            .await
            .expect("latest");
    }

    #[rstest]
    #[tokio::test]
    async fn summary_names_pipeline_after_customers() {
        let customer_id = Uuid::new_v4();
        let mut proposal = sample(ProposalStatus::FollowUp2);
        proposal.customer_id = Some(customer_id);
        let since = fixed_now() - Duration::days(SUMMARY_WINDOW_DAYS);
        let mut proposals = MockProposalRepository::new();
        proposals.expect_count().returning(|f| {
            Ok(match f.status_set {
                Some(StatusSet::Active) => 7,
                _ => 2,
            })
        });
        proposals
            .expect_list_all()
            .withf(move |f| f.updated_since == Some(since))
            .return_once(move |_| Ok(vec![proposal]));
        let mut orders = MockOrderRepository::new();
        orders.expect_count().return_once(|_| Ok(4));
        orders
            .expect_list_all()
            .withf(move |f| f.created_since == Some(since))
            .return_once(|_| Ok(Vec::new()));
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_names()
            .withf(move |ids| ids == [customer_id])
            .return_once(move |_| Ok(vec![(customer_id, "Avery Stone".to_owned())]));

        let summary = service(proposals, orders, customers)
            .summary(&fixtures::admin())
            .await
            .expect("summary");
        assert_eq!(summary.pipeline[0].name, "Avery Stone");
        assert_eq!(summary.counts.active_proposals, 7);
        assert_eq!(summary.counts.active_orders, 4);
    }

    #[rstest]
    #[tokio::test]
    async fn dashboard_needs_module_access() {
        let err = service(
            MockProposalRepository::new(),
            MockOrderRepository::new(),
            MockCustomerRepository::new(),
        )
        .counts(&fixtures::contractor(ModuleAccess::default()))
        .await
        .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
