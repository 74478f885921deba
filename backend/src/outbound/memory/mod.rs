//! In-process repository adapters.
//!
//! [`MemoryStore`] implements every domain port over a single mutex-guarded
//! set of tables. The server falls back to it when no database URL is
//! configured, and the HTTP tests run against it. Uniqueness rules mirror the
//! database constraints so services see the same collision errors.

mod catalog;
mod modifications;
mod orders;
mod proposals;
mod settings;
mod users;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::catalog::{AssemblyCost, CatalogItem};
use crate::domain::customer::Customer;
use crate::domain::manufacturer::Manufacturer;
use crate::domain::modification::{
    ModificationAssignment, ModificationCategory, ModificationTemplate,
};
use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::domain::proposal::Proposal;
use crate::domain::resources::ResourceLink;
use crate::domain::settings::{Location, Tax};
use crate::domain::share::ShareSession;
use crate::domain::user::User;
use crate::domain::user_group::UserGroup;

const POISONED: &str = "memory store lock poisoned";

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<Uuid, UserGroup>,
    manufacturers: BTreeMap<Uuid, Manufacturer>,
    catalog: BTreeMap<Uuid, CatalogItem>,
    assembly_costs: HashMap<Uuid, AssemblyCost>,
    modification_categories: BTreeMap<Uuid, ModificationCategory>,
    modification_templates: BTreeMap<Uuid, ModificationTemplate>,
    modification_assignments: BTreeMap<Uuid, ModificationAssignment>,
    customers: BTreeMap<Uuid, Customer>,
    locations: BTreeMap<Uuid, Location>,
    taxes: Vec<Tax>,
    resources: BTreeMap<Uuid, ResourceLink>,
    proposals: BTreeMap<Uuid, Proposal>,
    share_sessions: HashMap<String, ShareSession>,
    orders: BTreeMap<Uuid, Order>,
    payments: BTreeMap<Uuid, Payment>,
}

/// Repository adapter keeping every table in memory.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use cabinet_backend::domain::ports::UserRepository;
/// use cabinet_backend::outbound::memory::MemoryStore;
///
/// let store = Arc::new(MemoryStore::default());
/// let _users: Arc<dyn UserRepository> = store;
/// ```
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables.lock().map_err(|_| POISONED.to_owned())
    }
}

/// Slice one page out of already filtered and ordered rows.
fn paginate<T>(rows: Vec<T>, page: PageRequest) -> Paginated<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = rows.into_iter().skip(offset).take(limit).collect();
    Paginated::new(items, page, total)
}

#[cfg(test)]
mod tests {
    //! Pagination slicing shared by every table.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 10, 0..10)]
    #[case(3, 10, 20..25)]
    #[case(4, 10, 0..0)]
    fn paginate_slices_rows(
        #[case] page: u32,
        #[case] limit: u32,
        #[case] expected: std::ops::Range<u32>,
    ) {
        let rows: Vec<u32> = (0..25).collect();
        let request = PageRequest::new(page, limit).expect("valid page");

        let result = paginate(rows, request);

        assert_eq!(result.items, expected.collect::<Vec<_>>());
        assert_eq!(result.pagination.total_items, 25);
        assert_eq!(result.pagination.total_pages, 3);
    }
}
