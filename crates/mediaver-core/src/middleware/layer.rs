//! Middleware stack for the Mediaver request pipeline
//!
//! Layers wrap the router: every request passes through the whole stack
//! before a handler is selected, so a layer can reject a request that no
//! route would ever see.

use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed next function for middleware chains
pub type BoxedNext =
    Arc<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> + Send + Sync>;

/// Trait for middleware that can be applied with `.layer()`
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(
        &self,
        req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    /// Clone this middleware into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A stack of middleware layers
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// Create a new empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a middleware layer to the stack
    ///
    /// Layers are executed in the order they are added (outermost first).
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Add a middleware layer to the beginning of the stack
    ///
    /// This layer will be executed first (outermost).
    pub fn prepend(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.insert(0, layer);
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Execute the middleware stack with a final handler
    pub fn execute(
        &self,
        req: Request,
        handler: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
        if self.layers.is_empty() {
            return handler(req);
        }

        // Build the chain from inside out so the first layer runs first
        let mut next = handler;

        for layer in self.layers.iter().rev() {
            let layer = layer.clone_box();
            let current_next = next;
            next = Arc::new(move |req: Request| {
                let layer = layer.clone_box();
                let next = current_next.clone();
                Box::pin(async move { layer.call(req, next).await })
                    as Pin<Box<dyn Future<Output = Response> + Send + 'static>>
            });
        }

        next(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_request;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    type Order = Arc<Mutex<Vec<(usize, &'static str)>>>;

    /// Records when it runs relative to the rest of the chain
    #[derive(Clone)]
    struct OrderTrackingMiddleware {
        id: usize,
        order: Order,
    }

    impl MiddlewareLayer for OrderTrackingMiddleware {
        fn call(
            &self,
            req: Request,
            next: BoxedNext,
        ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
            let id = self.id;
            let order = self.order.clone();

            Box::pin(async move {
                order.lock().unwrap().push((id, "pre"));
                let response = next(req).await;
                order.lock().unwrap().push((id, "post"));
                response
            })
        }

        fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
            Box::new(self.clone())
        }
    }

    /// Answers with a fixed status without calling the rest of the chain
    #[derive(Clone)]
    struct RejectingMiddleware {
        status: StatusCode,
    }

    impl MiddlewareLayer for RejectingMiddleware {
        fn call(
            &self,
            _req: Request,
            _next: BoxedNext,
        ) -> Pin<Box<dyn Future<Output = Response> + Send + 'static>> {
            let status = self.status;
            Box::pin(async move {
                http::Response::builder()
                    .status(status)
                    .body(http_body_util::Full::new(Bytes::from("rejected")))
                    .unwrap()
            })
        }

        fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
            Box::new(self.clone())
        }
    }

    fn ok_handler(called: Arc<AtomicBool>) -> BoxedNext {
        Arc::new(move |_req: Request| {
            let called = called.clone();
            Box::pin(async move {
                called.store(true, Ordering::SeqCst);
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(http_body_util::Full::new(Bytes::from("handler")))
                    .unwrap()
            }) as Pin<Box<dyn Future<Output = Response> + Send + 'static>>
        })
    }

    #[tokio::test]
    async fn empty_stack_calls_handler_directly() {
        let called = Arc::new(AtomicBool::new(false));
        let stack = LayerStack::new();

        let response = stack
            .execute(test_request(Method::GET, "/"), ok_handler(called.clone()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn prepended_layer_runs_first() {
        let order: Order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = LayerStack::new();
        stack.push(Box::new(OrderTrackingMiddleware { id: 1, order: order.clone() }));
        stack.prepend(Box::new(OrderTrackingMiddleware { id: 0, order: order.clone() }));
        assert_eq!(stack.len(), 2);

        let called = Arc::new(AtomicBool::new(false));
        stack
            .execute(test_request(Method::GET, "/"), ok_handler(called))
            .await;

        assert_eq!(
            *order.lock().unwrap(),
            vec![(0, "pre"), (1, "pre"), (1, "post"), (0, "post")]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_layers_run_outermost_first(num_layers in 1usize..8) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order: Order = Arc::new(Mutex::new(Vec::new()));
                let mut stack = LayerStack::new();
                for id in 0..num_layers {
                    stack.push(Box::new(OrderTrackingMiddleware { id, order: order.clone() }));
                }

                let called = Arc::new(AtomicBool::new(false));
                stack.execute(test_request(Method::GET, "/"), ok_handler(called)).await;

                let order = order.lock().unwrap();
                prop_assert_eq!(order.len(), num_layers * 2);
                for i in 0..num_layers {
                    prop_assert_eq!(order[i], (i, "pre"));
                    prop_assert_eq!(order[num_layers + i], (num_layers - 1 - i, "post"));
                }
                Ok(())
            });
            result?;
        }

        #[test]
        fn prop_rejecting_layer_short_circuits(
            status in 400u16..600,
            before in 0usize..4,
            after in 0usize..4,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order: Order = Arc::new(Mutex::new(Vec::new()));
                let status = StatusCode::from_u16(status).unwrap();

                let mut stack = LayerStack::new();
                for id in 0..before {
                    stack.push(Box::new(OrderTrackingMiddleware { id, order: order.clone() }));
                }
                stack.push(Box::new(RejectingMiddleware { status }));
                for id in 0..after {
                    stack.push(Box::new(OrderTrackingMiddleware { id: 100 + id, order: order.clone() }));
                }

                let called = Arc::new(AtomicBool::new(false));
                let response = stack
                    .execute(test_request(Method::GET, "/"), ok_handler(called.clone()))
                    .await;

                prop_assert_eq!(response.status(), status);
                prop_assert!(!called.load(Ordering::SeqCst));

                let order = order.lock().unwrap();
                prop_assert_eq!(order.len(), before * 2);
                prop_assert!(order.iter().all(|(id, _)| *id < 100));
                Ok(())
            });
            result?;
        }
    }
}
