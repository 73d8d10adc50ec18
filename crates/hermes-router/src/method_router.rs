//! Per-path method table.
//!
//! A [`MethodRouter`] holds at most one [`Endpoint`] per supported verb for a
//! single path shape.

use hermes_core::SUPPORTED_METHODS;
use http::Method;

/// A registered route endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint<T> {
    /// Value returned on a match
    pub value: T,
    /// Template as registered
    pub template: String,
    /// Placeholder names in template order
    pub param_names: Vec<String>,
    /// Registration order, used to break specificity ties
    pub order: usize,
}

impl<T> Endpoint<T> {
    /// Number of placeholder segments in the template.
    #[must_use]
    pub fn placeholders(&self) -> usize {
        self.param_names.len()
    }
}

/// Maps HTTP methods to endpoints for one path shape.
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<Endpoint<T>>,
    head: Option<Endpoint<T>>,
    post: Option<Endpoint<T>>,
    put: Option<Endpoint<T>>,
    patch: Option<Endpoint<T>>,
    delete: Option<Endpoint<T>>,
    options: Option<Endpoint<T>>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            head: None,
            post: None,
            put: None,
            patch: None,
            delete: None,
            options: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `method` can be routed at all.
    #[must_use]
    pub fn supports(method: &Method) -> bool {
        SUPPORTED_METHODS.contains(method)
    }

    fn slot(&self, method: &Method) -> Option<&Option<Endpoint<T>>> {
        match *method {
            Method::GET => Some(&self.get),
            Method::HEAD => Some(&self.head),
            Method::POST => Some(&self.post),
            Method::PUT => Some(&self.put),
            Method::PATCH => Some(&self.patch),
            Method::DELETE => Some(&self.delete),
            Method::OPTIONS => Some(&self.options),
            _ => None,
        }
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<Endpoint<T>>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::HEAD => Some(&mut self.head),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::PATCH => Some(&mut self.patch),
            Method::DELETE => Some(&mut self.delete),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }

    /// Stores `endpoint` for `method` unless the slot is taken.
    ///
    /// On a taken slot the existing endpoint is kept and the new one is
    /// handed back.
    pub fn set(&mut self, method: &Method, endpoint: Endpoint<T>) -> Result<(), Endpoint<T>> {
        let Some(slot) = self.slot_mut(method) else {
            return Err(endpoint);
        };
        if slot.is_some() {
            return Err(endpoint);
        }
        *slot = Some(endpoint);
        Ok(())
    }

    /// Returns the endpoint registered for `method`.
    #[must_use]
    pub fn endpoint(&self, method: &Method) -> Option<&Endpoint<T>> {
        self.slot(method).and_then(Option::as_ref)
    }

    /// Iterates over the methods that have an endpoint.
    pub fn allowed_methods(&self) -> impl Iterator<Item = &Method> + '_ {
        SUPPORTED_METHODS
            .iter()
            .filter(move |m| self.endpoint(m).is_some())
    }

    /// Returns `true` if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_methods().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(value: &'static str, order: usize) -> Endpoint<&'static str> {
        Endpoint {
            value,
            template: "/t".to_string(),
            param_names: Vec::new(),
            order,
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut router = MethodRouter::new();
        assert!(router.set(&Method::GET, endpoint("list", 0)).is_ok());
        assert!(router.set(&Method::POST, endpoint("create", 1)).is_ok());

        assert_eq!(router.endpoint(&Method::GET).map(|e| e.value), Some("list"));
        assert_eq!(router.endpoint(&Method::POST).map(|e| e.value), Some("create"));
        assert!(router.endpoint(&Method::DELETE).is_none());
    }

    #[test]
    fn test_first_registration_is_kept() {
        let mut router = MethodRouter::new();
        router.set(&Method::GET, endpoint("first", 0)).unwrap();
        let rejected = router.set(&Method::GET, endpoint("second", 1)).unwrap_err();

        assert_eq!(rejected.value, "second");
        assert_eq!(router.endpoint(&Method::GET).map(|e| e.value), Some("first"));
    }

    #[test]
    fn test_unsupported_method_is_rejected() {
        let mut router = MethodRouter::new();
        assert!(router.set(&Method::TRACE, endpoint("trace", 0)).is_err());
        assert!(!MethodRouter::<()>::supports(&Method::CONNECT));
        assert!(router.is_empty());
    }

    #[test]
    fn test_allowed_methods_order() {
        let mut router = MethodRouter::new();
        router.set(&Method::DELETE, endpoint("d", 0)).unwrap();
        router.set(&Method::GET, endpoint("g", 1)).unwrap();

        let allowed: Vec<_> = router.allowed_methods().cloned().collect();
        assert_eq!(allowed, vec![Method::GET, Method::DELETE]);
    }
}
