//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los servicios comparten el mismo
//! almacenamiento inyectado.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::EntityStore;
use crate::services::{AllocationGuard, CapacityAllocator, RequestService, RouteLifecycle, StudentService};

pub struct AppState<S: EntityStore> {
    pub config: Arc<EnvironmentConfig>,
    pub allocator: Arc<CapacityAllocator<S>>,
    pub requests: Arc<RequestService<S>>,
    pub routes: Arc<RouteLifecycle<S>>,
    pub allocations: Arc<AllocationGuard<S>>,
    pub students: Arc<StudentService<S>>,
}

impl<S: EntityStore> AppState<S> {
    pub fn new(store: Arc<S>, config: EnvironmentConfig) -> Self {
        let policy = config.allocation_policy;
        Self {
            config: Arc::new(config),
            allocator: Arc::new(CapacityAllocator::new(Arc::clone(&store))),
            requests: Arc::new(RequestService::new(Arc::clone(&store))),
            routes: Arc::new(RouteLifecycle::new(Arc::clone(&store))),
            allocations: Arc::new(AllocationGuard::new(Arc::clone(&store), policy)),
            students: Arc::new(StudentService::new(store)),
        }
    }
}

// Manual: derive(Clone) exigiría `S: Clone`
impl<S: EntityStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            allocator: Arc::clone(&self.allocator),
            requests: Arc::clone(&self.requests),
            routes: Arc::clone(&self.routes),
            allocations: Arc::clone(&self.allocations),
            students: Arc::clone(&self.students),
        }
    }
}
