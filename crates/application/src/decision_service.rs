//! Permission resolver: the single `check` walk, the bounded-concurrency
//! bulk engine, and the decision cache that keeps verdicts warm between
//! mutations.

mod cache;
mod metrics;
#[cfg(test)]
mod tests;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use rolegate_core::{AppError, AppResult, DepartmentId, EmployeeId, PermissionId, RoleId};
use rolegate_domain::{AuditAction, RoleForest, Verdict};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::rbac_ports::{
    AssignmentRepository, AuditEvent, AuditSink, GrantRepository, PermissionRepository,
    RoleRepository, record_best_effort,
};

pub use cache::DecisionCache;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};

/// Default upper bound on concurrently running bulk checks.
const DEFAULT_MAX_WORKERS: usize = 10;

/// One permission check as submitted by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Acting employee.
    pub employee_id: i64,
    /// Requested permission name.
    pub permission_name: String,
    /// Optional department scope of the request.
    pub department_scope: Option<i64>,
    /// Optional target-employee scope of the request.
    pub target_employee_scope: Option<i64>,
}

/// Outcome of one item of a bulk check, correlated to its input by index.
#[derive(Debug)]
pub struct BulkCheckResult {
    /// Position of the request in the submitted batch.
    pub index: usize,
    /// The request as submitted.
    pub request: CheckRequest,
    /// The item's verdict, or the error that aborted this item alone.
    pub outcome: AppResult<Verdict>,
}

struct ValidatedCheck {
    employee_id: EmployeeId,
    permission_name: String,
    department_scope: Option<DepartmentId>,
    target_scope: Option<EmployeeId>,
}

/// Resolves permission checks against assignments, the role hierarchy, and
/// scoped grants, with a cache-aside verdict cache in front of the walk.
#[derive(Clone)]
pub struct DecisionService {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    grants: Arc<dyn GrantRepository>,
    permissions: Arc<dyn PermissionRepository>,
    audit: Arc<dyn AuditSink>,
    cache: Arc<DecisionCache>,
    max_workers: usize,
}

impl DecisionService {
    /// Creates the resolver over its ports.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        grants: Arc<dyn GrantRepository>,
        permissions: Arc<dyn PermissionRepository>,
        audit: Arc<dyn AuditSink>,
        cache: Arc<DecisionCache>,
    ) -> Self {
        Self {
            roles,
            assignments,
            grants,
            permissions,
            audit,
            cache,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Overrides the bulk worker bound. Values below one are clamped to one.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Decides one permission check.
    ///
    /// A cached verdict, Allow or Deny alike, is returned without touching
    /// the store. On a miss the full walk runs: resolve the permission name,
    /// load the employee's assignments, walk each assigned role's ancestor
    /// chain, and test every grant attached anywhere on those chains against
    /// the requested scopes. The resulting verdict is cached and audited.
    pub async fn check(&self, request: &CheckRequest) -> AppResult<Verdict> {
        let validated = validate(request)?;

        let key = self.cache.key_for(
            validated.employee_id,
            &validated.permission_name,
            validated.department_scope,
            validated.target_scope,
        );
        if let Some(verdict) = self.cache.get_verdict(&key).await {
            debug!(key = key.as_str(), verdict = verdict.as_str(), "cache hit");
            return Ok(verdict);
        }
        debug!(key = key.as_str(), "cache miss");

        let (verdict, permission_id) = self.resolve(&validated).await?;

        self.cache.store_verdict(&key, verdict).await;
        record_best_effort(
            self.audit.as_ref(),
            AuditEvent {
                actor_id: Some(validated.employee_id),
                action: AuditAction::PermissionChecked,
                target_type: "permission".to_owned(),
                target_id: permission_id.map_or(0, |id| id.as_i64()),
                detail: Some(format!(
                    "{} -> {}",
                    validated.permission_name,
                    verdict.as_str()
                )),
            },
        )
        .await;

        Ok(verdict)
    }

    async fn resolve(
        &self,
        check: &ValidatedCheck,
    ) -> AppResult<(Verdict, Option<PermissionId>)> {
        let Some(permission) = self
            .permissions
            .find_permission_by_name(&check.permission_name)
            .await?
        else {
            return Ok((Verdict::Deny, None));
        };

        let assignments = self
            .assignments
            .list_assignments_for_employee(check.employee_id)
            .await?;
        if assignments.is_empty() {
            return Ok((Verdict::Deny, Some(permission.id)));
        }

        let forest = RoleForest::from_roles(&self.roles.list_roles(None).await?);
        let mut reachable: HashSet<RoleId> = HashSet::new();
        for assignment in &assignments {
            reachable.extend(forest.ancestor_chain(assignment.role_id));
        }
        if reachable.is_empty() {
            return Ok((Verdict::Deny, Some(permission.id)));
        }

        let role_ids: Vec<RoleId> = reachable.into_iter().collect();
        let grants = self.grants.list_grants_for_roles(&role_ids).await?;
        let allowed = grants.iter().any(|grant| {
            grant.matches(permission.id, check.department_scope, check.target_scope)
        });

        let verdict = if allowed { Verdict::Allow } else { Verdict::Deny };
        Ok((verdict, Some(permission.id)))
    }

    /// Decides a batch of checks with bounded concurrency.
    ///
    /// Returns exactly one result per input, in input order, correlated by
    /// index so duplicate requests keep distinct slots. An item's failure is
    /// captured in its own slot and never aborts the rest of the batch; the
    /// call returns only once every item has finished.
    pub async fn check_many(&self, requests: Vec<CheckRequest>) -> Vec<BulkCheckResult> {
        if requests.is_empty() {
            return Vec::new();
        }

        let workers = self.max_workers.min(requests.len());
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut join_set = JoinSet::new();

        for (index, request) in requests.iter().cloned().enumerate() {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => service.check(&request).await,
                    Err(_) => Err(AppError::Internal(
                        "bulk check pool closed unexpectedly".to_owned(),
                    )),
                };
                (index, request, outcome)
            });
        }

        let mut slots: Vec<Option<BulkCheckResult>> = Vec::new();
        slots.resize_with(requests.len(), || None);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, request, outcome)) => {
                    slots[index] = Some(BulkCheckResult {
                        index,
                        request,
                        outcome,
                    });
                }
                Err(error) => {
                    warn!(error = %error, "bulk check worker terminated abnormally");
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| BulkCheckResult {
                    index,
                    request: requests[index].clone(),
                    outcome: Err(AppError::Internal(
                        "bulk check worker terminated abnormally".to_owned(),
                    )),
                })
            })
            .collect()
    }

    /// Returns, per requested employee, the distinct names of permissions
    /// granted directly to the employee's assigned roles. Employees without
    /// assignments map to an empty set.
    pub async fn effective_permission_names(
        &self,
        employee_ids: &[EmployeeId],
    ) -> AppResult<HashMap<EmployeeId, BTreeSet<String>>> {
        let mut names_by_employee: HashMap<EmployeeId, BTreeSet<String>> = employee_ids
            .iter()
            .map(|employee_id| (*employee_id, BTreeSet::new()))
            .collect();
        if employee_ids.is_empty() {
            return Ok(names_by_employee);
        }

        let assignments = self
            .assignments
            .list_assignments_for_employees(employee_ids)
            .await?;
        let mut roles_by_employee: HashMap<EmployeeId, Vec<RoleId>> = HashMap::new();
        let mut all_role_ids: HashSet<RoleId> = HashSet::new();
        for assignment in &assignments {
            roles_by_employee
                .entry(assignment.employee_id)
                .or_default()
                .push(assignment.role_id);
            all_role_ids.insert(assignment.role_id);
        }
        if all_role_ids.is_empty() {
            return Ok(names_by_employee);
        }

        let role_ids: Vec<RoleId> = all_role_ids.into_iter().collect();
        let grants = self.grants.list_grants_for_roles(&role_ids).await?;
        let mut permissions_by_role: HashMap<RoleId, Vec<PermissionId>> = HashMap::new();
        let mut all_permission_ids: HashSet<PermissionId> = HashSet::new();
        for grant in &grants {
            permissions_by_role
                .entry(grant.role_id)
                .or_default()
                .push(grant.permission_id);
            all_permission_ids.insert(grant.permission_id);
        }

        let permission_ids: Vec<PermissionId> = all_permission_ids.into_iter().collect();
        let names_by_id: HashMap<PermissionId, String> = self
            .permissions
            .find_permissions_by_ids(&permission_ids)
            .await?
            .into_iter()
            .map(|permission| (permission.id, permission.name))
            .collect();

        for (employee_id, role_ids) in &roles_by_employee {
            let Some(names) = names_by_employee.get_mut(employee_id) else {
                continue;
            };
            for role_id in role_ids {
                for permission_id in permissions_by_role.get(role_id).into_iter().flatten() {
                    if let Some(name) = names_by_id.get(permission_id) {
                        names.insert(name.clone());
                    }
                }
            }
        }

        Ok(names_by_employee)
    }

    /// Shares the decision cache counters.
    #[must_use]
    pub fn cache_metrics(&self) -> Arc<CacheMetrics> {
        self.cache.metrics()
    }
}

fn validate(request: &CheckRequest) -> AppResult<ValidatedCheck> {
    let employee_id = EmployeeId::new(request.employee_id)?;
    let permission_name = request.permission_name.trim();
    if permission_name.is_empty() {
        return Err(AppError::Validation(
            "permission name must not be empty".to_owned(),
        ));
    }
    let department_scope = request
        .department_scope
        .map(DepartmentId::new)
        .transpose()?;
    let target_scope = request
        .target_employee_scope
        .map(EmployeeId::new)
        .transpose()?;

    Ok(ValidatedCheck {
        employee_id,
        permission_name: permission_name.to_owned(),
        department_scope,
        target_scope,
    })
}
