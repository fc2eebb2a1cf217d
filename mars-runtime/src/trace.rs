use std::env;
use std::fmt;
use std::sync::OnceLock;

/// Trace categories, enabled via environment variables.
///
/// Supported:
/// - MARS_TRACE="syscall,event,resource" (comma/space separated; "all" enables all)
/// - MARS_TRACE_SYSCALL=1, MARS_TRACE_EVENT=1, MARS_TRACE_RESOURCE=1
///
/// Traces go through `log::info!`, so a logger still has to be installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    Syscall,
    Event,
    Resource,
}

const M_SYSCALL: u32 = 1 << 0;
const M_EVENT: u32 = 1 << 1;
const M_RESOURCE: u32 = 1 << 2;
const M_ALL: u32 = M_SYSCALL | M_EVENT | M_RESOURCE;

fn parse_bool_env(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => parse_bool(&v),
        Err(_) => false,
    }
}

fn parse_bool(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
}

fn parse_mask(s: &str) -> u32 {
    let mut mask = 0u32;
    for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        let t = raw.trim().to_ascii_lowercase();
        match t.as_str() {
            "" => {}
            "all" => mask |= M_ALL,
            "syscall" | "sc" => mask |= M_SYSCALL,
            "event" | "ev" => mask |= M_EVENT,
            "resource" | "res" => mask |= M_RESOURCE,
            other => log::debug!("trace: ignoring unknown category {:?}", other),
        }
    }
    mask
}

fn build_mask() -> u32 {
    let mut mask = 0u32;

    if let Ok(list) = env::var("MARS_TRACE") {
        mask |= parse_mask(&list);
    }
    if parse_bool_env("MARS_TRACE_SYSCALL") {
        mask |= M_SYSCALL;
    }
    if parse_bool_env("MARS_TRACE_EVENT") {
        mask |= M_EVENT;
    }
    if parse_bool_env("MARS_TRACE_RESOURCE") {
        mask |= M_RESOURCE;
    }
    mask
}

fn mask() -> u32 {
    static MASK: OnceLock<u32> = OnceLock::new();
    *MASK.get_or_init(build_mask)
}

fn bit(k: TraceKind) -> u32 {
    match k {
        TraceKind::Syscall => M_SYSCALL,
        TraceKind::Event => M_EVENT,
        TraceKind::Resource => M_RESOURCE,
    }
}

pub fn enabled(k: TraceKind) -> bool {
    mask() & bit(k) != 0
}

pub fn syscall(args: fmt::Arguments) {
    if !enabled(TraceKind::Syscall) {
        return;
    }
    log::info!("[syscall] {}", args);
}

pub fn event(args: fmt::Arguments) {
    if !enabled(TraceKind::Event) {
        return;
    }
    log::info!("[event] {}", args);
}

pub fn resource(args: fmt::Arguments) {
    if !enabled(TraceKind::Resource) {
        return;
    }
    log::info!("[resource] {}", args);
}
