//! The Resource Manager (spec.md §4.8, component C10): soft/hard/emergency
//! thresholds, priority queueing for waitable requests, and a background
//! monitor loop that releases expired allocations and samples usage —
//! grounded on the teacher's `parallel-workers::coordinator` semaphore-style
//! admission control and `tool-ecosystem::executor::ResourceLimiter`,
//! generalized to the full request/grant/wait contract spec.md §4.8 names.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use qa_contracts::{ResourceAllocation, ResourceRequest, ResourceType};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ResourceError;
use crate::limits::{AllocationStrategy, ResourceLimits};

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

struct ResourceTypeState {
    limits: ResourceLimits,
    available: f64,
    current_usage: f64,
}

struct Waiter {
    score: f64,
    seq: u64,
    request: ResourceRequest,
    responder: oneshot::Sender<Result<ResourceAllocation, ResourceError>>,
}

impl PartialEq for Waiter {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}
impl Eq for Waiter {}
impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Waiter {
    /// `BinaryHeap` is a max-heap; the highest-priority waiter must
    /// compare greatest. Ties break FIFO — the earlier `seq` wins, so on
    /// equal score a smaller `seq` must compare as greater.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// `urgencyFactor(timeout)` of spec.md §4.8: a shorter timeout is more
/// urgent. Normalized so a 1s timeout scores near 10 and a 5-minute
/// timeout scores near 0.
fn urgency_factor(timeout: f64) -> f64 {
    if timeout <= 0.0 {
        10.0
    } else {
        (10.0 - (timeout / 30.0).min(10.0)).max(0.0)
    }
}

/// `scarcityFactor(pool)` of spec.md §4.8: less available headroom scores
/// higher.
fn scarcity_factor(state: &ResourceTypeState) -> f64 {
    if state.limits.hard_limit <= 0.0 {
        0.0
    } else {
        let headroom = (state.available / state.limits.hard_limit).clamp(0.0, 1.0);
        (1.0 - headroom) * 10.0
    }
}

fn priority_score(strategy: AllocationStrategy, req: &ResourceRequest, state: &ResourceTypeState) -> f64 {
    let requester_term = 10.0 - req.priority as f64;
    let urgency = urgency_factor(req.timeout);
    let scarcity = scarcity_factor(state);
    match strategy {
        AllocationStrategy::FairShare => urgency + scarcity,
        AllocationStrategy::PriorityBased => requester_term * 2.0 + urgency + scarcity,
        AllocationStrategy::DemandBased => requester_term + urgency + scarcity * 2.0,
        AllocationStrategy::Adaptive => requester_term + urgency + scarcity,
        AllocationStrategy::Greedy => req.amount,
    }
}

struct Inner {
    strategy: AllocationStrategy,
    types: HashMap<ResourceType, ResourceTypeState>,
    allocations: HashMap<String, ResourceAllocation>,
    pending: BinaryHeap<Waiter>,
    next_seq: u64,
}

fn try_grant_locked(
    inner: &mut Inner,
    req: &ResourceRequest,
) -> Option<Result<ResourceAllocation, ResourceError>> {
    let Some(state) = inner.types.get_mut(&req.resource_type) else {
        return Some(Err(ResourceError::UnconfiguredResourceType(req.resource_type)));
    };
    let would_use = state.current_usage + req.amount;
    if state.available >= req.amount && would_use <= state.limits.hard_limit {
        state.available -= req.amount;
        state.current_usage = would_use;
        let soft_exceeded = would_use > state.limits.soft_limit;
        let alloc = ResourceAllocation {
            allocation_id: Uuid::new_v4().to_string(),
            requester_id: req.requester_id.clone(),
            resource_type: req.resource_type,
            amount: req.amount,
            start: now_seconds(),
            expires_at: if req.duration_estimate > 0.0 {
                Some(now_seconds() + req.duration_estimate)
            } else {
                None
            },
            actual_usage: 0.0,
            active: true,
        };
        inner.allocations.insert(alloc.allocation_id.clone(), alloc.clone());
        if soft_exceeded {
            warn!(
                resource_type = ?req.resource_type,
                usage = would_use,
                soft_limit = state.limits.soft_limit,
                "resource usage crossed soft limit"
            );
        }
        Some(Ok(alloc))
    } else {
        None
    }
}

fn release_locked(inner: &mut Inner, allocation_id: &str) -> bool {
    let Some(alloc) = inner.allocations.get_mut(allocation_id) else {
        return false;
    };
    if !alloc.active {
        return false;
    }
    alloc.active = false;
    let (rtype, amount) = (alloc.resource_type, alloc.amount);
    if let Some(state) = inner.types.get_mut(&rtype) {
        state.available += amount;
        state.current_usage = (state.current_usage - amount).max(0.0);
    }
    true
}

fn drain_pending_locked(inner: &mut Inner) -> Vec<(Waiter, Result<ResourceAllocation, ResourceError>)> {
    let mut granted = Vec::new();
    loop {
        let Some(top) = inner.pending.peek() else { break };
        match try_grant_locked(inner, &top.request) {
            Some(result) => {
                let waiter = inner.pending.pop().expect("peeked above");
                granted.push((waiter, result));
            }
            None => break,
        }
    }
    granted
}

/// Per-resource-type status snapshot returned by [`ResourceManager::status`].
#[derive(Debug, Clone)]
pub struct ResourceTypeSnapshot {
    pub available: f64,
    pub current_usage: f64,
    pub hard_limit: f64,
    pub emergency_limit: f64,
}

#[derive(Debug, Clone)]
pub struct ResourceManagerSnapshot {
    pub by_type: HashMap<ResourceType, ResourceTypeSnapshot>,
    pub pending_count: usize,
    pub active_allocation_count: usize,
}

/// Single authority for resource allocation across one executor run (spec.md
/// §5 "the Resource Manager is the single authority"). Cheap to clone — the
/// actual state lives behind an `Arc<Mutex<..>>`, matching the teacher's
/// `ChainExecutor`/`ParallelToolCoordinator` "clone the handle, share the
/// state" convention.
#[derive(Clone)]
pub struct ResourceManager {
    inner: Arc<Mutex<Inner>>,
    cancel: CancellationToken,
}

impl ResourceManager {
    /// Spawns the background monitor loop (spec.md §4.8) on the current
    /// Tokio runtime; call from within an async context (or before
    /// `Runtime::block_on` has returned).
    pub fn new(limits: HashMap<ResourceType, ResourceLimits>, strategy: AllocationStrategy) -> Self {
        let types = limits
            .into_iter()
            .map(|(rtype, limits)| {
                (
                    rtype,
                    ResourceTypeState {
                        available: limits.initial_pool,
                        current_usage: 0.0,
                        limits,
                    },
                )
            })
            .collect();
        let inner = Arc::new(Mutex::new(Inner {
            strategy,
            types,
            allocations: HashMap::new(),
            pending: BinaryHeap::new(),
            next_seq: 0,
        }));
        let cancel = CancellationToken::new();
        let manager = Self { inner, cancel };
        manager.spawn_monitor();
        manager
    }

    fn spawn_monitor(&self) {
        let inner = self.inner.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(250));
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("resource manager monitor loop stopped");
                        return;
                    }
                    _ = interval.tick() => {}
                }

                let now = now_seconds();
                let (expired, granted) = {
                    let mut guard = inner.lock();
                    let expired: Vec<String> = guard
                        .allocations
                        .iter()
                        .filter(|(_, a)| a.active && a.expires_at.map_or(false, |exp| exp <= now))
                        .map(|(id, _)| id.clone())
                        .collect();
                    for id in &expired {
                        release_locked(&mut guard, id);
                    }
                    let granted = drain_pending_locked(&mut guard);

                    for (rtype, state) in guard.types.iter() {
                        if state.current_usage > state.limits.emergency_limit {
                            warn!(
                                resource_type = ?rtype,
                                usage = state.current_usage,
                                emergency_limit = state.limits.emergency_limit,
                                "resource usage above emergency limit"
                            );
                        }
                    }
                    (expired, granted)
                };

                for id in &expired {
                    debug!(allocation_id = %id, "auto-released expired allocation");
                }
                for (waiter, result) in granted {
                    let _ = waiter.responder.send(result);
                }
            }
        });
    }

    /// Stops the background monitor loop. Pending waiters are left
    /// unresolved; callers should drain/timeout them before shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// `request(ResourceRequest) → ResourceAllocation or Rejected`, spec.md
    /// §4.8. Grants immediately if possible; otherwise enqueues (if
    /// `can_wait`) and awaits a grant up to `timeout` seconds, or rejects
    /// immediately.
    pub async fn request(&self, req: ResourceRequest) -> Result<ResourceAllocation, ResourceError> {
        let immediate = {
            let mut inner = self.inner.lock();
            try_grant_locked(&mut inner, &req)
        };
        if let Some(result) = immediate {
            return result;
        }

        if !req.can_wait {
            return Err(ResourceError::Denied {
                resource_type: req.resource_type,
                reason: "pool exhausted and request declared it cannot wait".to_string(),
            });
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock();
            let state = inner.types.get(&req.resource_type);
            let score = match state {
                Some(state) => priority_score(inner.strategy, &req, state),
                None => {
                    return Err(ResourceError::UnconfiguredResourceType(req.resource_type));
                }
            };
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.pending.push(Waiter {
                score,
                seq,
                request: req.clone(),
                responder: tx,
            });
        }

        let timeout = Duration::from_secs_f64(req.timeout.max(0.0));
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ResourceError::Denied {
                resource_type: req.resource_type,
                reason: "resource manager dropped the waiter".to_string(),
            }),
            Err(_) => Err(ResourceError::TimedOut {
                resource_type: req.resource_type,
            }),
        }
    }

    /// `release(allocationId) → bool`, spec.md §4.8. Also services the
    /// pending queue, per "process pending queue on each release".
    pub fn release(&self, allocation_id: &str) -> bool {
        let (released, granted) = {
            let mut inner = self.inner.lock();
            let released = release_locked(&mut inner, allocation_id);
            let granted = if released {
                drain_pending_locked(&mut inner)
            } else {
                Vec::new()
            };
            (released, granted)
        };
        for (waiter, result) in granted {
            let _ = waiter.responder.send(result);
        }
        released
    }

    /// `updateUsage(allocationId, actual)`, spec.md §4.8.
    pub fn update_usage(&self, allocation_id: &str, actual_usage: f64) -> Result<(), ResourceError> {
        let mut inner = self.inner.lock();
        match inner.allocations.get_mut(allocation_id) {
            Some(alloc) => {
                alloc.actual_usage = actual_usage;
                Ok(())
            }
            None => Err(ResourceError::UnknownAllocation(allocation_id.to_string())),
        }
    }

    /// `status() → snapshot`, spec.md §4.8.
    pub fn status(&self) -> ResourceManagerSnapshot {
        let inner = self.inner.lock();
        let by_type = inner
            .types
            .iter()
            .map(|(rtype, state)| {
                (
                    *rtype,
                    ResourceTypeSnapshot {
                        available: state.available,
                        current_usage: state.current_usage,
                        hard_limit: state.limits.hard_limit,
                        emergency_limit: state.limits.emergency_limit,
                    },
                )
            })
            .collect();
        ResourceManagerSnapshot {
            by_type,
            pending_count: inner.pending.len(),
            active_allocation_count: inner.allocations.values().filter(|a| a.active).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::ResourceRequest;

    fn manager() -> ResourceManager {
        let mut limits = HashMap::new();
        limits.insert(
            ResourceType::Memory,
            ResourceLimits::new(1000.0, 700.0, 900.0, 950.0),
        );
        ResourceManager::new(limits, AllocationStrategy::Adaptive)
    }

    #[tokio::test]
    async fn immediate_grant_when_pool_has_headroom() {
        let mgr = manager();
        let req = ResourceRequest::new("tool-a", ResourceType::Memory, 200.0);
        let alloc = mgr.request(req).await.unwrap();
        assert!(alloc.active);
        assert_eq!(mgr.status().by_type[&ResourceType::Memory].current_usage, 200.0);
    }

    #[tokio::test]
    async fn denies_immediately_when_cannot_wait_and_pool_exhausted() {
        let mgr = manager();
        let big = ResourceRequest::new("tool-a", ResourceType::Memory, 950.0);
        let _alloc = mgr.request(big).await.unwrap();

        let mut overflow = ResourceRequest::new("tool-b", ResourceType::Memory, 100.0);
        overflow.can_wait = false;
        let result = mgr.request(overflow).await;
        assert!(matches!(result, Err(ResourceError::Denied { .. })));
    }

    #[tokio::test]
    async fn release_frees_pool_for_pending_waiter() {
        let mgr = manager();
        let first = ResourceRequest::new("tool-a", ResourceType::Memory, 900.0);
        let alloc = mgr.request(first).await.unwrap();

        let mgr_clone = mgr.clone();
        let waiter = tokio::spawn(async move {
            let mut req = ResourceRequest::new("tool-b", ResourceType::Memory, 200.0);
            req.timeout = 5.0;
            mgr_clone.request(req).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(mgr.release(&alloc.allocation_id));

        let granted = waiter.await.unwrap();
        assert!(granted.is_ok());
    }

    #[tokio::test]
    async fn unconfigured_resource_type_is_an_error() {
        let mgr = ResourceManager::new(HashMap::new(), AllocationStrategy::Adaptive);
        let req = ResourceRequest::new("tool-a", ResourceType::Cpu, 1.0);
        let result = mgr.request(req).await;
        assert!(matches!(result, Err(ResourceError::UnconfiguredResourceType(_))));
    }
}
