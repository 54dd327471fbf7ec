use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rolegate_core::{
    AppError, AppResult, DepartmentId, EmployeeId, GrantId, NonEmptyString, PermissionId, RoleId,
};
use rolegate_domain::{Permission, Role, RoleAssignment, ScopedGrant, Verdict};

use crate::decision_service::{CheckRequest, DecisionCache, DecisionService};
use crate::rbac_ports::{
    AssignmentRepository, AuditEvent, AuditSink, CreateRoleInput, GrantInput, GrantRepository,
    KeyValueCache, PermissionRepository, RoleRepository, UpdateRoleInput,
};

fn emp(value: i64) -> EmployeeId {
    EmployeeId::new(value).unwrap_or_else(|_| unreachable!())
}

fn rid(value: i64) -> RoleId {
    RoleId::new(value).unwrap_or_else(|_| unreachable!())
}

fn pid(value: i64) -> PermissionId {
    PermissionId::new(value).unwrap_or_else(|_| unreachable!())
}

fn did(value: i64) -> DepartmentId {
    DepartmentId::new(value).unwrap_or_else(|_| unreachable!())
}

fn role(id: i64, parent: Option<i64>) -> Role {
    Role {
        id: rid(id),
        name: format!("role-{id}"),
        department_id: did(1),
        parent_role_id: parent.map(rid),
        is_global: false,
    }
}

fn permission(id: i64, name: &str) -> Permission {
    Permission {
        id: pid(id),
        name: name.to_owned(),
        is_global: false,
    }
}

fn grant(id: i64, role: i64, perm: i64, dept: Option<i64>, target: Option<i64>) -> ScopedGrant {
    ScopedGrant {
        id: GrantId::new(id).unwrap_or_else(|_| unreachable!()),
        role_id: rid(role),
        permission_id: pid(perm),
        department_id: dept.map(did),
        employee_id: target.map(emp),
    }
}

fn assignment(employee: i64, role: i64) -> RoleAssignment {
    RoleAssignment {
        employee_id: emp(employee),
        role_id: rid(role),
        assigned_at: Utc::now(),
    }
}

fn request(employee: i64, name: &str) -> CheckRequest {
    CheckRequest {
        employee_id: employee,
        permission_name: name.to_owned(),
        department_scope: None,
        target_employee_scope: None,
    }
}

fn scoped_request(employee: i64, name: &str, dept: Option<i64>, target: Option<i64>) -> CheckRequest {
    CheckRequest {
        employee_id: employee,
        permission_name: name.to_owned(),
        department_scope: dept,
        target_employee_scope: target,
    }
}

#[derive(Default)]
struct FakeRoles {
    rows: Mutex<Vec<Role>>,
}

impl FakeRoles {
    fn with(rows: Vec<Role>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
        })
    }
}

#[async_trait]
impl RoleRepository for FakeRoles {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows.iter().find(|row| row.id == role_id).cloned())
    }

    async fn list_roles(&self, department_id: Option<DepartmentId>) -> AppResult<Vec<Role>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .filter(|row| department_id.is_none_or(|dept| row.department_id == dept))
            .cloned()
            .collect())
    }

    async fn create_role(&self, _input: CreateRoleInput) -> AppResult<Role> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }

    async fn update_role(&self, _role_id: RoleId, _input: UpdateRoleInput) -> AppResult<Role> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }

    async fn soft_delete_role(&self, _role_id: RoleId) -> AppResult<()> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }
}

#[derive(Default)]
struct FakeAssignments {
    rows: Mutex<Vec<RoleAssignment>>,
    unavailable: AtomicBool,
}

impl FakeAssignments {
    fn with(rows: Vec<RoleAssignment>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            unavailable: AtomicBool::new(false),
        })
    }

    fn remove(&self, employee_id: EmployeeId, role_id: RoleId) {
        let mut rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        rows.retain(|row| !(row.employee_id == employee_id && row.role_id == role_id));
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("assignments down".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for FakeAssignments {
    async fn list_assignments_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.check_available()?;
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .filter(|row| row.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list_assignments_for_employees(
        &self,
        employee_ids: &[EmployeeId],
    ) -> AppResult<Vec<RoleAssignment>> {
        self.check_available()?;
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .filter(|row| employee_ids.contains(&row.employee_id))
            .cloned()
            .collect())
    }

    async fn find_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .find(|row| row.employee_id == employee_id && row.role_id == role_id)
            .cloned())
    }

    async fn create_assignment(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<RoleAssignment> {
        let mut rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        if rows
            .iter()
            .any(|row| row.employee_id == employee_id && row.role_id == role_id)
        {
            return Err(AppError::Conflict("assignment exists".to_owned()));
        }
        let created = RoleAssignment {
            employee_id,
            role_id,
            assigned_at: Utc::now(),
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn create_assignment_if_absent(
        &self,
        employee_id: EmployeeId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        if !rows
            .iter()
            .any(|row| row.employee_id == employee_id && row.role_id == role_id)
        {
            rows.push(RoleAssignment {
                employee_id,
                role_id,
                assigned_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn reassign(
        &self,
        employee_id: EmployeeId,
        from_role_id: RoleId,
        to_role_id: RoleId,
    ) -> AppResult<()> {
        self.remove(employee_id, from_role_id);
        let mut rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        rows.push(RoleAssignment {
            employee_id,
            role_id: to_role_id,
            assigned_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_assignment(&self, employee_id: EmployeeId, role_id: RoleId) -> AppResult<()> {
        self.remove(employee_id, role_id);
        Ok(())
    }

    async fn delete_assignments(
        &self,
        employee_id: EmployeeId,
        role_ids: &[RoleId],
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        rows.retain(|row| !(row.employee_id == employee_id && role_ids.contains(&row.role_id)));
        Ok(())
    }

    async fn list_employees_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<EmployeeId>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        let mut employees: Vec<EmployeeId> = rows
            .iter()
            .filter(|row| role_ids.contains(&row.role_id))
            .map(|row| row.employee_id)
            .collect();
        employees.sort();
        employees.dedup();
        Ok(employees)
    }
}

#[derive(Default)]
struct FakeGrants {
    rows: Mutex<Vec<ScopedGrant>>,
}

impl FakeGrants {
    fn with(rows: Vec<ScopedGrant>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
        })
    }

    fn push(&self, grant: ScopedGrant) {
        let mut rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        rows.push(grant);
    }
}

#[async_trait]
impl GrantRepository for FakeGrants {
    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<ScopedGrant>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows.iter().find(|row| row.id == grant_id).cloned())
    }

    async fn list_grants(&self, role_id: Option<RoleId>) -> AppResult<Vec<ScopedGrant>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .filter(|row| role_id.is_none_or(|wanted| row.role_id == wanted))
            .cloned()
            .collect())
    }

    async fn list_grants_for_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<ScopedGrant>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .filter(|row| role_ids.contains(&row.role_id))
            .cloned()
            .collect())
    }

    async fn create_grant(&self, _input: GrantInput) -> AppResult<ScopedGrant> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }

    async fn update_grant(&self, _grant_id: GrantId, _input: GrantInput) -> AppResult<ScopedGrant> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }

    async fn soft_delete_grant(&self, _grant_id: GrantId) -> AppResult<()> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }
}

#[derive(Default)]
struct FakePermissions {
    rows: Mutex<Vec<Permission>>,
}

impl FakePermissions {
    fn with(rows: Vec<Permission>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
        })
    }
}

#[async_trait]
impl PermissionRepository for FakePermissions {
    async fn find_permission(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows.iter().find(|row| row.id == permission_id).cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows.iter().find(|row| row.name == name).cloned())
    }

    async fn find_permissions_by_ids(
        &self,
        permission_ids: &[PermissionId],
    ) -> AppResult<Vec<Permission>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows
            .iter()
            .filter(|row| permission_ids.contains(&row.id))
            .cloned()
            .collect())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let rows = self.rows.lock().unwrap_or_else(|_| unreachable!());
        Ok(rows.clone())
    }

    async fn create_permission(
        &self,
        _name: NonEmptyString,
        _is_global: bool,
    ) -> AppResult<Permission> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }

    async fn update_permission(
        &self,
        _permission_id: PermissionId,
        _name: NonEmptyString,
        _is_global: bool,
    ) -> AppResult<Permission> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }

    async fn soft_delete_permission(&self, _permission_id: PermissionId) -> AppResult<()> {
        Err(AppError::Internal("unused in this fake".to_owned()))
    }
}

#[derive(Default)]
struct FakeAudit {
    events: Mutex<Vec<AuditEvent>>,
    failing: AtomicBool,
}

impl FakeAudit {
    fn recorded(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(|_| unreachable!()).clone()
    }
}

#[async_trait]
impl AuditSink for FakeAudit {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("audit table down".to_owned()));
        }
        let mut events = self.events.lock().unwrap_or_else(|_| unreachable!());
        events.push(event);
        Ok(())
    }
}

#[derive(Default)]
struct FakeCache {
    entries: RwLock<HashMap<String, String>>,
    failing: AtomicBool,
}

impl FakeCache {
    fn check_available(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::CacheUnavailable("backend down".to_owned()));
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|_| unreachable!()).len()
    }
}

#[async_trait]
impl KeyValueCache for FakeCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check_available()?;
        let entries = self.entries.read().unwrap_or_else(|_| unreachable!());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> AppResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write().unwrap_or_else(|_| unreachable!());
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write().unwrap_or_else(|_| unreachable!());
        entries.remove(key);
        Ok(())
    }

    async fn list_keys_by_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.check_available()?;
        let entries = self.entries.read().unwrap_or_else(|_| unreachable!());
        Ok(entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

struct Fixture {
    assignments: Arc<FakeAssignments>,
    grants: Arc<FakeGrants>,
    audit: Arc<FakeAudit>,
    cache_backend: Arc<FakeCache>,
    cache: Arc<DecisionCache>,
    service: DecisionService,
}

fn fixture(
    roles: Vec<Role>,
    assignments: Vec<RoleAssignment>,
    grants: Vec<ScopedGrant>,
    permissions: Vec<Permission>,
) -> Fixture {
    let roles = FakeRoles::with(roles);
    let assignments = FakeAssignments::with(assignments);
    let grants = FakeGrants::with(grants);
    let permissions = FakePermissions::with(permissions);
    let audit = Arc::new(FakeAudit::default());
    let cache_backend = Arc::new(FakeCache::default());
    let cache = Arc::new(DecisionCache::new(
        Arc::clone(&cache_backend) as Arc<dyn KeyValueCache>,
        "test",
    ));
    let service = DecisionService::new(
        Arc::clone(&roles) as Arc<dyn RoleRepository>,
        Arc::clone(&assignments) as Arc<dyn AssignmentRepository>,
        Arc::clone(&grants) as Arc<dyn GrantRepository>,
        Arc::clone(&permissions) as Arc<dyn PermissionRepository>,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
        Arc::clone(&cache),
    );
    Fixture {
        assignments,
        grants,
        audit,
        cache_backend,
        cache,
        service,
    }
}

#[tokio::test]
async fn direct_grant_allows() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let verdict = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(verdict, Ok(Verdict::Allow)));
}

#[tokio::test]
async fn child_role_inherits_ancestor_grant() {
    // rep is the root; manager inherits everything grantable to rep.
    let fx = fixture(
        vec![role(1, None), role(2, Some(1))],
        vec![assignment(10, 2), assignment(11, 1)],
        vec![
            grant(1, 1, 100, None, None),
            grant(2, 2, 200, None, None),
        ],
        vec![
            permission(100, "leads.view"),
            permission(200, "discounts.approve"),
        ],
    );

    let inherited = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(inherited, Ok(Verdict::Allow)));

    // Inheritance flows one way only.
    let upward = fx.service.check(&request(11, "discounts.approve")).await;
    assert!(matches!(upward, Ok(Verdict::Deny)));
}

#[tokio::test]
async fn department_scoped_grant_requires_matching_scope() {
    let sales = 3;
    let hr = 4;
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, Some(sales), None)],
        vec![permission(100, "reports.read")],
    );

    let in_sales = fx
        .service
        .check(&scoped_request(10, "reports.read", Some(sales), None))
        .await;
    assert!(matches!(in_sales, Ok(Verdict::Allow)));

    let in_hr = fx
        .service
        .check(&scoped_request(10, "reports.read", Some(hr), None))
        .await;
    assert!(matches!(in_hr, Ok(Verdict::Deny)));

    // A scoped grant never satisfies a scopeless check.
    let unscoped = fx.service.check(&request(10, "reports.read")).await;
    assert!(matches!(unscoped, Ok(Verdict::Deny)));
}

#[tokio::test]
async fn unknown_permission_name_denies() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let verdict = fx.service.check(&request(10, "no.such.permission")).await;
    assert!(matches!(verdict, Ok(Verdict::Deny)));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_lookup() {
    let fx = fixture(Vec::new(), Vec::new(), Vec::new(), Vec::new());

    let zero_employee = fx.service.check(&request(0, "leads.view")).await;
    assert!(matches!(zero_employee, Err(AppError::Validation(_))));

    let empty_name = fx.service.check(&request(10, "   ")).await;
    assert!(matches!(empty_name, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn cached_deny_is_honored_until_invalidation() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        Vec::new(),
        vec![permission(100, "leads.view")],
    );

    let first = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(first, Ok(Verdict::Deny)));

    // The grant lands without invalidation; the stale Deny still wins.
    fx.grants.push(grant(1, 1, 100, None, None));
    let stale = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(stale, Ok(Verdict::Deny)));

    fx.cache.invalidate_all().await;
    let fresh = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(fresh, Ok(Verdict::Allow)));
}

#[tokio::test]
async fn cache_outage_falls_back_to_the_store() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );
    fx.cache_backend.failing.store(true, Ordering::SeqCst);

    let verdict = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(verdict, Ok(Verdict::Allow)));

    let metrics = fx.service.cache_metrics().snapshot();
    assert!(metrics.errors >= 1);
    assert_eq!(metrics.hits, 0);
}

#[tokio::test]
async fn audit_failure_never_fails_the_check() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );
    fx.audit.failing.store(true, Ordering::SeqCst);

    let verdict = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(verdict, Ok(Verdict::Allow)));
    assert!(fx.audit.recorded().is_empty());
}

#[tokio::test]
async fn resolution_emits_one_audit_event() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let verdict = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(verdict, Ok(Verdict::Allow)));

    let events = fx.audit.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor_id, Some(emp(10)));
    assert_eq!(events[0].target_id, 100);
}

#[tokio::test]
async fn verdicts_are_cached_per_scope() {
    let sales = 3;
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, Some(sales), None)],
        vec![permission(100, "reports.read")],
    );

    let allowed = fx
        .service
        .check(&scoped_request(10, "reports.read", Some(sales), None))
        .await;
    assert!(matches!(allowed, Ok(Verdict::Allow)));
    let denied = fx.service.check(&request(10, "reports.read")).await;
    assert!(matches!(denied, Ok(Verdict::Deny)));

    // Two distinct keys, one per scope shape.
    assert_eq!(fx.cache_backend.len(), 2);
}

#[tokio::test]
async fn bulk_results_keep_input_order_and_duplicates() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let requests = vec![
        request(10, "leads.view"),
        request(0, "leads.view"),
        request(10, "leads.view"),
        request(10, "no.such.permission"),
    ];
    let results = fx.service.check_many(requests.clone()).await;

    assert_eq!(results.len(), requests.len());
    for (position, result) in results.iter().enumerate() {
        assert_eq!(result.index, position);
        assert_eq!(result.request, requests[position]);
    }
    assert!(matches!(results[0].outcome, Ok(Verdict::Allow)));
    assert!(matches!(results[1].outcome, Err(AppError::Validation(_))));
    assert!(matches!(results[2].outcome, Ok(Verdict::Allow)));
    assert!(matches!(results[3].outcome, Ok(Verdict::Deny)));
}

#[tokio::test]
async fn bulk_item_store_failure_stays_in_its_slot() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );
    fx.assignments.unavailable.store(true, Ordering::SeqCst);

    let results = fx
        .service
        .check_many(vec![request(10, "leads.view"), request(0, "leads.view")])
        .await;

    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0].outcome,
        Err(AppError::StoreUnavailable(_))
    ));
    assert!(matches!(results[1].outcome, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn bulk_of_empty_input_is_empty() {
    let fx = fixture(Vec::new(), Vec::new(), Vec::new(), Vec::new());
    assert!(fx.service.check_many(Vec::new()).await.is_empty());
}

#[tokio::test]
async fn bulk_handles_batches_larger_than_the_worker_bound() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let requests: Vec<CheckRequest> = (0..25).map(|_| request(10, "leads.view")).collect();
    let results = fx.service.check_many(requests).await;

    assert_eq!(results.len(), 25);
    assert!(results
        .iter()
        .all(|result| matches!(result.outcome, Ok(Verdict::Allow))));
}

#[tokio::test]
async fn effective_permission_names_are_direct_and_distinct() {
    let fx = fixture(
        vec![role(1, None), role(2, Some(1))],
        vec![assignment(10, 2), assignment(11, 1), assignment(11, 2)],
        vec![
            grant(1, 1, 100, None, None),
            grant(2, 2, 200, None, None),
            grant(3, 2, 200, Some(3), None),
        ],
        vec![
            permission(100, "leads.view"),
            permission(200, "discounts.approve"),
        ],
    );

    let names = fx
        .service
        .effective_permission_names(&[emp(10), emp(11), emp(12)])
        .await
        .unwrap_or_else(|_| unreachable!());

    // Direct grants only, no hierarchy walk, duplicates collapsed.
    assert_eq!(names.get(&emp(10)).map(|set| set.len()), Some(1));
    assert!(names[&emp(10)].contains("discounts.approve"));
    assert_eq!(names.get(&emp(11)).map(|set| set.len()), Some(2));
    assert_eq!(names.get(&emp(12)).map(|set| set.len()), Some(0));
}

#[tokio::test]
async fn assignment_removal_plus_invalidation_changes_the_verdict() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let before = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(before, Ok(Verdict::Allow)));

    fx.assignments.remove(emp(10), rid(1));
    fx.cache.invalidate_employee(emp(10)).await;

    let after = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(after, Ok(Verdict::Deny)));
}

#[tokio::test]
async fn employee_invalidation_leaves_other_employees_cached() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1), assignment(11, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let first = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(first, Ok(Verdict::Allow)));
    let second = fx.service.check(&request(11, "leads.view")).await;
    assert!(matches!(second, Ok(Verdict::Allow)));
    assert_eq!(fx.cache_backend.len(), 2);

    fx.cache.invalidate_employee(emp(10)).await;
    assert_eq!(fx.cache_backend.len(), 1);
}

#[tokio::test]
async fn unparseable_cached_value_is_treated_as_a_miss() {
    let fx = fixture(
        vec![role(1, None)],
        vec![assignment(10, 1)],
        vec![grant(1, 1, 100, None, None)],
        vec![permission(100, "leads.view")],
    );

    let key = fx.cache.key_for(emp(10), "leads.view", None, None);
    fx.cache_backend
        .set(&key, "maybe", Duration::from_secs(60))
        .await
        .unwrap_or_else(|_| unreachable!());

    let verdict = fx.service.check(&request(10, "leads.view")).await;
    assert!(matches!(verdict, Ok(Verdict::Allow)));
}

#[tokio::test]
async fn cache_key_shape_appends_scopes_in_order() {
    let fx = fixture(Vec::new(), Vec::new(), Vec::new(), Vec::new());

    assert_eq!(
        fx.cache.key_for(emp(7), "leads.view", None, None),
        "test:perm:7:leads.view"
    );
    assert_eq!(
        fx.cache.key_for(emp(7), "leads.view", Some(did(3)), Some(emp(9))),
        "test:perm:7:leads.view:3:9"
    );
}
