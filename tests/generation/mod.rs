mod concurrency_test;
mod dispatch_test;
mod strategies_test;
mod traceability_test;
