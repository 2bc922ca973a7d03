use std::collections::HashSet;

use axum::http::Method;
use axum::routing::MethodRouter;
use axum::Router;

/// The set of path/method pairs that sit behind the session gate.
///
/// Matching is exact on both path and method: no prefixes, no patterns. A path
/// protected for POST is open for GET.
#[derive(Debug, Clone, Default)]
pub struct ProtectionTable {
    exact: HashSet<(Method, String)>,
    any_method: HashSet<String>,
}

impl ProtectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protect(&mut self, method: Method, path: &str) {
        self.exact.insert((method, path.to_string()));
    }

    /// Protects `path` whatever the request method.
    pub fn protect_any(&mut self, path: &str) {
        self.any_method.insert(path.to_string());
    }

    pub fn is_protected(&self, method: &Method, path: &str) -> bool {
        self.any_method.contains(path) || self.exact.contains(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.any_method.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registers routes and their protection in one place, so the table the gate
/// consults is exactly what was declared next to each route.
pub struct GatedRouter<S> {
    router: Router<S>,
    table: ProtectionTable,
}

impl<S> Default for GatedRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> GatedRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        GatedRouter {
            router: Router::new(),
            table: ProtectionTable::new(),
        }
    }

    /// A route the gate never inspects.
    pub fn open(mut self, path: &str, handler: MethodRouter<S>) -> Self {
        self.router = self.router.route(path, handler);
        self
    }

    /// A route whose listed methods require a session.
    pub fn protected(mut self, path: &str, methods: &[Method], handler: MethodRouter<S>) -> Self {
        for method in methods {
            self.table.protect(method.clone(), path);
        }
        self.router = self.router.route(path, handler);
        self
    }

    /// A route that requires a session for every method.
    pub fn protected_any(mut self, path: &str, handler: MethodRouter<S>) -> Self {
        self.table.protect_any(path);
        self.router = self.router.route(path, handler);
        self
    }

    pub fn into_parts(self) -> (Router<S>, ProtectionTable) {
        (self.router, self.table)
    }
}
