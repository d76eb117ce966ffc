//! Alert system for displaying success and error messages to users.
//!
//! Alerts are swapped into the `#alert-container` element of the base page,
//! either through `hx-target-error` for failed requests or rendered inline
//! on a page.

use maud::{Markup, html};

/// A dismissable message for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something worked.
    Success {
        /// The headline.
        message: String,
    },
    /// Something went wrong, with extra details.
    Error {
        /// The headline.
        message: String,
        /// More detail shown under the headline.
        details: String,
    },
}

const SUCCESS_STYLE: &str = "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
    border border-green-300 dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
    border border-red-300 dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

impl Alert {
    /// Render the alert.
    pub fn into_html(self) -> Markup {
        let (style, role, message, details) = match self {
            Alert::Success { message } => (SUCCESS_STYLE, "status", message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, "alert", message, details),
        };

        // Adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div class=(style) role=(role) data-alert
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="text-lg leading-none opacity-70 hover:opacity-100"
                        onclick="this.closest('[data-alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}
