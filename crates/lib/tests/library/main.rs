mod common;
mod reconcile_tests;
mod repository_tests;
