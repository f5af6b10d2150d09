//! Robots.txt parser implementation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate, which applies
//! longest-match precedence (ties allow) and percent-encodes non-ASCII rule
//! paths. A URL must be allowed for this crawler's product token and for every
//! `*bot*` agent the file names. `Crawl-delay` and `Sitemap` lines are read by
//! a small directive scan.

use robotstxt::DefaultMatcher;

/// `Crawl-delay` declared under one run of `User-agent` lines
#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

impl Group {
    fn applies_to(&self, token: &str) -> bool {
        self.agents
            .iter()
            .any(|agent| agent == "*" || agent.contains("bot") || agent == token)
    }
}

/// Product token of a user agent string, lower-cased
///
/// `SumiAudit/1.0 (+https://example.com/bot)` yields `sumiaudit`.
pub fn product_token(user_agent: &str) -> String {
    user_agent
        .trim()
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    /// Raw robots.txt content
    content: String,
    /// Agents of other groups that contain `bot`
    bot_agents: Vec<String>,
    groups: Vec<Group>,
    sitemaps: Vec<String>,
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a new RobotsPolicy from raw robots.txt content
    ///
    /// Lines that are not `key: value` directives are ignored, so arbitrary
    /// text parses to a policy that allows everything.
    pub fn from_content(content: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut bot_agents: Vec<String> = Vec::new();
        let mut sitemaps = Vec::new();
        let mut current: Option<Group> = None;
        let mut last_was_agent = false;

        for line in content.lines() {
            // Strip comments
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if value.is_empty() {
                        continue;
                    }
                    if !last_was_agent {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                        current = Some(Group::default());
                    }
                    let agent = product_token(value);
                    if agent != "*" && agent.contains("bot") && !bot_agents.contains(&agent) {
                        bot_agents.push(agent.clone());
                    }
                    if let Some(group) = current.as_mut() {
                        group.agents.push(agent);
                    }
                    last_was_agent = true;
                }
                "crawl-delay" => {
                    last_was_agent = false;
                    if let (Some(group), Ok(delay)) = (current.as_mut(), value.parse::<f64>()) {
                        if delay.is_finite() && delay >= 0.0 {
                            group.crawl_delay = Some(delay);
                        }
                    }
                }
                "sitemap" => {
                    // Sitemap lines are global and do not end the group
                    if !value.is_empty() {
                        sitemaps.push(value.to_string());
                    }
                }
                _ => {
                    last_was_agent = false;
                }
            }
        }

        if let Some(group) = current.take() {
            groups.push(group);
        }

        Self {
            content: content.to_string(),
            bot_agents,
            groups,
            sitemaps,
            allow_all: false,
        }
    }

    /// Creates a permissive RobotsPolicy that allows everything
    ///
    /// This is used when robots.txt cannot be fetched or is absent.
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            ..Self::default()
        }
    }

    /// Returns true if this policy was produced by the fail-open path
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// The crawler's own group (or `*` when it has none) and every group
    /// naming a `*bot*` agent must allow the URL.
    ///
    /// # Arguments
    ///
    /// * `url` - An absolute URL or a path (e.g., "/page.html?x=1")
    /// * `user_agent` - The full user agent string; only its product token is matched
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let token = product_token(user_agent);
        let mut matcher = DefaultMatcher::default();
        if !matcher.one_agent_allowed_by_robots(&self.content, &token, url) {
            return false;
        }

        self.bot_agents
            .iter()
            .filter(|agent| **agent != token)
            .all(|agent| {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, agent, url)
            })
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// When several applicable groups declare a delay, the largest one wins.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all {
            return None;
        }

        let token = product_token(user_agent);
        self.groups
            .iter()
            .filter(|g| g.applies_to(&token))
            .filter_map(|g| g.crawl_delay)
            .fold(None, |acc: Option<f64>, delay| {
                Some(acc.map_or(delay, |current| current.max(delay)))
            })
    }

    /// Sitemap URLs declared with `Sitemap:` directives
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }
}
