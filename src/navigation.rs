//! The navigation bar shown at the top of every page behind the log-in.

use maud::{Markup, html};

use crate::endpoints;

/// The pages in the navigation bar as (url, title).
const LINKS: [(&str, &str); 3] = [
    (endpoints::TRACKER_VIEW, "Tracker"),
    (endpoints::PROFILE_VIEW, "Profile"),
    (endpoints::LOG_OUT, "Log out"),
];

const LINK_STYLE: &str = "block rounded px-3 py-2 text-sm font-medium text-gray-700 \
    hover:bg-gray-100 hover:text-blue-700 dark:text-gray-300 dark:hover:bg-gray-700 \
    dark:hover:text-white";

const CURRENT_LINK_STYLE: &str = "block rounded px-3 py-2 text-sm font-semibold \
    bg-blue-50 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";

/// The navigation bar, with the link for the page being viewed highlighted.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl NavBar<'_> {
    /// A navigation bar where the link to `active_endpoint`, if there is one,
    /// is marked as the current page.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        NavBar { active_endpoint }
    }

    fn links(&self) -> Markup {
        html! {
            @for (url, title) in LINKS {
                @let is_current = url == self.active_endpoint;

                li
                {
                    a
                        href=(url)
                        class=(if is_current { CURRENT_LINK_STYLE } else { LINK_STYLE })
                        aria-current=[is_current.then_some("page")]
                    {
                        (title)
                    }
                }
            }
        }
    }

    pub fn into_html(self) -> Markup {
        // Layout adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html! {
            nav class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                div class="max-w-screen-xl mx-auto flex items-center justify-between p-4"
                {
                    a href=(endpoints::TRACKER_VIEW) class="flex items-center gap-3"
                    {
                        img src="/static/favicon-128x128.png" alt="DompetKu Logo" class="h-8";

                        span class="text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "DompetKu"
                        }
                    }

                    ul class="hidden lg:flex lg:gap-4" { (self.links()) }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden" aria-label="Primary"
            {
                ul
                    class="mx-4 mb-4 grid grid-cols-3 gap-2 rounded-xl border border-gray-200
                    bg-white/95 p-3 text-center shadow-lg dark:border-gray-700 dark:bg-gray-900/95"
                {
                    (self.links())
                }
            }
        }
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    fn render(active_endpoint: &str) -> Html {
        Html::parse_fragment(&NavBar::new(active_endpoint).into_html().into_string())
    }

    fn current_links(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("a[aria-current=page]").unwrap())
            .filter_map(|link| link.value().attr("href").map(str::to_owned))
            .collect()
    }

    #[test]
    fn marks_the_current_page_in_both_bars() {
        for endpoint in [endpoints::TRACKER_VIEW, endpoints::PROFILE_VIEW] {
            let html = render(endpoint);

            assert_eq!(current_links(&html), [endpoint, endpoint]);
        }
    }

    #[test]
    fn pages_outside_the_bar_mark_nothing() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::TRANSACTIONS_API,
        ] {
            let html = render(endpoint);

            assert!(
                current_links(&html).is_empty(),
                "{endpoint} should not mark a link as current"
            );
        }
    }

    #[test]
    fn renders_every_link_for_desktop_and_mobile() {
        let html = render(endpoints::TRACKER_VIEW);

        let hrefs: Vec<_> = html
            .select(&Selector::parse("li a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();

        assert_eq!(
            hrefs,
            [
                endpoints::TRACKER_VIEW,
                endpoints::PROFILE_VIEW,
                endpoints::LOG_OUT,
                endpoints::TRACKER_VIEW,
                endpoints::PROFILE_VIEW,
                endpoints::LOG_OUT,
            ]
        );
    }
}
