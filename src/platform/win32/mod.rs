//! Win32 shell surface
//!
//! A single map window with software-rendered chrome, message-box alerts,
//! a modal prompt dialog, and the WinRT location service.

pub mod dialogs;
pub mod geolocation;
pub mod window;

pub use window::{WakeTarget, run};

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to register window class")]
    ClassRegistrationFailed,
    #[error("Failed to create window")]
    WindowCreationFailed,
    #[error("Windows API error: {0}")]
    Win32Error(String),
}

pub(crate) fn to_wstring(input: &str) -> Vec<u16> {
    input.encode_utf16().chain(std::iter::once(0)).collect()
}
