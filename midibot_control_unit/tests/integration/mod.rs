mod bounce;
mod concurrency;
mod config_files;
mod encoding;
mod invariants;
mod lifecycle;
mod watchdog;
