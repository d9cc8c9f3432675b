pub mod backport;
