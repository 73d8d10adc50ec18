//! High-level router API.

use http::Method;

use crate::method_router::{Endpoint, MethodRouter};
use crate::node::Node;
use crate::params::Params;
use crate::template::{overlaps, parse_template, same_shape, Segment};
use crate::{RouteMatch, RouterError};

/// Result of [`Router::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum InsertOutcome {
    /// The route was added with no competing template.
    Inserted,
    /// The route was added, but an earlier route with the same method and
    /// the same number of placeholders can match the same paths. The earlier
    /// route wins those ties.
    Ambiguous {
        /// Template of the earlier route
        existing: String,
    },
    /// An earlier route has the identical shape and method; the new route
    /// was not added and will never be selected.
    Shadowed {
        /// Template of the earlier route
        existing: String,
    },
}

/// Outcome of [`Router::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// A route serves this method and path.
    Found(RouteMatch<'a, T>),
    /// Some route matches the path, none for this method.
    MethodNotAllowed(Vec<Method>),
    /// No template matches the path.
    NotFound,
}

#[derive(Debug, Clone)]
struct Registered {
    method: Method,
    segments: Vec<Segment>,
    template: String,
}

/// A radix tree router over values of type `T`.
///
/// # Route Priority
///
/// When several templates match a path, the router picks the one with the
/// fewest placeholder segments, then the one registered first. Because every
/// candidate leaf is collected, this holds even when the placeholder sits
/// earlier in one template than the other (`/a/{x}/c` vs `/a/b/{y}`).
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    routes: Vec<Registered>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            routes: Vec::new(),
        }
    }

    /// Registers `value` for `method` and `template`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hermes_router::{InsertOutcome, Router};
    /// use http::Method;
    ///
    /// let mut router = Router::new();
    /// assert_eq!(router.insert(&Method::GET, "/users/{id}", 1).unwrap(), InsertOutcome::Inserted);
    /// assert!(matches!(
    ///     router.insert(&Method::GET, "/users/{name}", 2).unwrap(),
    ///     InsertOutcome::Shadowed { .. }
    /// ));
    /// ```
    pub fn insert(
        &mut self,
        method: &Method,
        template: &str,
        value: T,
    ) -> Result<InsertOutcome, RouterError> {
        if !MethodRouter::<T>::supports(method) {
            return Err(RouterError::UnsupportedMethod(method.clone()));
        }
        let segments = parse_template(template)?;

        let shadowed_by = self.routes.iter().find(|r| {
            r.method == *method
                && r.segments.len() == segments.len()
                && r.segments.iter().zip(&segments).all(|(a, b)| same_shape(a, b))
        });
        if let Some(existing) = shadowed_by {
            return Ok(InsertOutcome::Shadowed {
                existing: existing.template.clone(),
            });
        }

        let placeholders = segments.iter().filter(|s| s.is_param()).count();
        let ambiguous_with = self.routes.iter().find(|r| {
            r.method == *method
                && r.segments.len() == segments.len()
                && r.segments.iter().filter(|s| s.is_param()).count() == placeholders
                && r.segments.iter().zip(&segments).all(|(a, b)| overlaps(a, b))
        });
        let outcome = match ambiguous_with {
            Some(existing) => InsertOutcome::Ambiguous {
                existing: existing.template.clone(),
            },
            None => InsertOutcome::Inserted,
        };

        let endpoint = Endpoint {
            value,
            template: template.to_string(),
            param_names: segments
                .iter()
                .filter_map(|s| match s {
                    Segment::Param(name) => Some(name.clone()),
                    Segment::Literal(_) => None,
                })
                .collect(),
            order: self.routes.len(),
        };

        if self.root.leaf_mut(&segments).set(method, endpoint).is_err() {
            // The shape check above already covers every occupied slot.
            return Ok(InsertOutcome::Shadowed {
                existing: template.to_string(),
            });
        }

        self.routes.push(Registered {
            method: method.clone(),
            segments,
            template: template.to_string(),
        });
        Ok(outcome)
    }

    /// Resolves `method` and `path` to a registered route.
    ///
    /// `path` must not include the query string.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_, T> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut candidates = Vec::new();
        self.root.collect(&segments, &mut Vec::new(), &mut candidates);

        if candidates.is_empty() {
            return Lookup::NotFound;
        }

        let best = candidates
            .iter()
            .filter_map(|(methods, values)| methods.endpoint(method).map(|e| (e, values)))
            .min_by_key(|(endpoint, _)| (endpoint.placeholders(), endpoint.order));

        match best {
            Some((endpoint, values)) => {
                let params: Params = endpoint
                    .param_names
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect();
                Lookup::Found(RouteMatch {
                    value: &endpoint.value,
                    template: &endpoint.template,
                    params,
                })
            }
            None => {
                let mut allowed: Vec<Method> = Vec::new();
                for method in candidates.iter().flat_map(|(m, _)| m.allowed_methods()) {
                    if !allowed.contains(method) {
                        allowed.push(method.clone());
                    }
                }
                Lookup::MethodNotAllowed(allowed)
            }
        }
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
