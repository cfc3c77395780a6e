//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging (startup notice with the route list)
//! - Access logging with multiple formats
//! - The error sink that records handler faults
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::dispatch::routes::RouteTable;
use crate::dispatch::Fault;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    if writer::is_initialized() {
        writer::get().write_access(message);
    } else {
        println!("{message}");
    }
}

/// Emit the startup notice: bound address, static root, and the route list.
pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: &RouteTable) {
    write_info("======================================");
    write_info("webstead started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Static root: {}", config.site.root));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info("Routes:");
    for entry in routes.entries() {
        let method = entry.method().map_or("any", hyper::Method::as_str);
        write_info(&format!(
            "  {:<4} {:<12} ({})",
            method,
            entry.pattern().to_string(),
            entry.name()
        ));
    }
    write_info("  GET  /<asset>     (static files under the root)");
    write_info("======================================\n");
}

/// Record a handler fault to the error log.
///
/// Full detail stays server-side; the client only ever sees the generic 500
/// body built by the dispatcher.
pub fn log_handler_fault(fault: &Fault) {
    write_error(&format!("[FAULT] Route handler failed: {fault}"));
}

/// Log a formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}
