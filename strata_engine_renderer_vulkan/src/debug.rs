/// Vulkan Debug Messenger - routes validation layer messages into the engine logger
///
/// The messenger owns its callback state (counters and the repeat tracker)
/// and hands a pointer to it to the driver as user data, so several
/// devices can run side by side without sharing globals.

use ash::vk;
use colored::*;
use rustc_hash::FxHashMap;
use strata_engine::strata::{EngineContext, Error, Result};
use strata_engine::strata::log::LogSeverity;
use strata_engine::engine_error;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Log source used for every validation message
pub const VALIDATION_SOURCE: &str = "strata::vulkan::validation";

/// Validation message counts since the device was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
    /// Distinct messages that were reported more than once
    pub repeated: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// State reachable from the callback
struct DebugUserData {
    ctx: Arc<EngineContext>,
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
    /// Occurrences per message id
    messages: Mutex<FxHashMap<String, u32>>,
}

impl DebugUserData {
    fn track(&self, message_id: &str) -> u32 {
        match self.messages.lock() {
            Ok(mut messages) => {
                let count = messages.entry(message_id.to_string()).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 1,
        }
    }

    fn stats(&self) -> ValidationStats {
        let repeated = self
            .messages
            .lock()
            .map(|messages| messages.values().filter(|&&count| count > 1).count() as u32)
            .unwrap_or(0);
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
            repeated,
        }
    }
}

/// Debug utils messenger and the state its callback writes to
pub(crate) struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    user_data: Box<DebugUserData>,
}

impl DebugMessenger {
    /// Install the messenger
    ///
    /// Verbose and info messages are only requested when the engine logs
    /// at debug severity or below.
    pub(crate) fn new(entry: &ash::Entry, instance: &ash::Instance, ctx: Arc<EngineContext>) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);

        let mut severity_flags = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING;
        if ctx.min_severity() <= LogSeverity::Debug {
            severity_flags |= vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE;
        }

        let user_data = Box::new(DebugUserData {
            ctx,
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
            messages: Mutex::new(FxHashMap::default()),
        });

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity_flags)
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback))
            .user_data(&*user_data as *const DebugUserData as *mut std::os::raw::c_void);

        let messenger = unsafe { loader.create_debug_utils_messenger(&debug_info, None) }
            .map_err(|e| {
                engine_error!(user_data.ctx, "strata::vulkan", "Failed to create debug messenger: {:?}", e);
                Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
            })?;

        Ok(Self { loader, messenger, user_data })
    }

    pub(crate) fn stats(&self) -> ValidationStats {
        self.user_data.stats()
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

/// Print a colored validation summary to stderr
pub fn print_validation_report(stats: &ValidationStats) {
    if stats.total() == 0 {
        eprintln!("\n{}", "✓ No validation messages".green().bold());
        return;
    }

    eprintln!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        eprintln!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        eprintln!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        eprintln!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        eprintln!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    eprintln!("  {} {}", "Total:".white().bold(), stats.total());

    if stats.repeated > 0 {
        eprintln!("\n  {} {} message(s) appeared multiple times", "ℹ".cyan(), stats.repeated);
    }

    eprintln!("{}\n", "====================================".bright_blue().bold());
}

/// Map a driver severity to the engine's
fn severity_of(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

fn type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    p_user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_user_data.is_null() || p_callback_data.is_null() {
        return vk::FALSE;
    }
    let user_data = &*(p_user_data as *const DebugUserData);
    let callback_data = &*p_callback_data;

    let message_id = if callback_data.p_message_id_name.is_null() {
        "Unknown".into()
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy()
    };
    let message = if callback_data.p_message.is_null() {
        "No message".into()
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    let severity = severity_of(message_severity);
    let counter = match severity {
        LogSeverity::Error => &user_data.errors,
        LogSeverity::Warn => &user_data.warnings,
        LogSeverity::Debug => &user_data.info,
        _ => &user_data.verbose,
    };
    counter.fetch_add(1, Ordering::Relaxed);

    let occurrences = user_data.track(&message_id);
    let repeat = if occurrences > 1 { format!(" [x{}]", occurrences) } else { String::new() };

    user_data.ctx.log(
        severity,
        VALIDATION_SOURCE,
        format!("[{}] {}{}: {}", type_name(message_type), message_id, repeat, message),
    );

    // Never abort the call that triggered the message
    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
