use clap::ValueEnum;
use tabled::Tabled;
use usersearch::{
    CancelToken, DateRangeFilter, GitHubClient, GitHubError, RangeFilter, SearchError,
    SearchFilters, SearchInField, SearchMetadata, SearchService, SearchSession, SortOption,
    SortOrder, UserRecord, UserType,
};

use crate::commands::limits::OutputFormat;
use crate::config::Config;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum UserTypeArg {
    User,
    Org,
}

impl From<UserTypeArg> for UserType {
    fn from(arg: UserTypeArg) -> Self {
        match arg {
            UserTypeArg::User => UserType::User,
            UserTypeArg::Org => UserType::Org,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum SearchInArg {
    Login,
    Name,
    Email,
}

impl From<SearchInArg> for SearchInField {
    fn from(arg: SearchInArg) -> Self {
        match arg {
            SearchInArg::Login => SearchInField::Login,
            SearchInArg::Name => SearchInField::Name,
            SearchInArg::Email => SearchInField::Email,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum SortArg {
    BestMatch,
    Followers,
    Repositories,
    Joined,
}

impl From<SortArg> for SortOption {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::BestMatch => SortOption::BestMatch,
            SortArg::Followers => SortOption::Followers,
            SortArg::Repositories => SortOption::Repositories,
            SortArg::Joined => SortOption::Joined,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

/// Arguments of the search command.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SearchArgs {
    /// Free-text search query
    pub query: String,

    /// Only users or only organizations
    #[arg(short = 't', long = "type", value_enum)]
    pub user_type: Option<UserTypeArg>,

    /// Restrict the query to these fields (comma separated)
    #[arg(long = "in", value_enum, value_delimiter = ',')]
    pub search_in: Vec<SearchInArg>,

    /// Public repository count: N, N..M, N.., ..M, >=N or <=N
    #[arg(short, long, value_parser = parse_range)]
    pub repos: Option<RangeFilter>,

    /// Follower count: N, N..M, N.., ..M, >=N or <=N
    #[arg(short, long, value_parser = parse_range)]
    pub followers: Option<RangeFilter>,

    /// Location, e.g. "San Francisco"
    #[arg(short, long)]
    pub location: Option<String>,

    /// Primary repository language
    #[arg(short = 'L', long)]
    pub language: Option<String>,

    /// Account creation date (YYYY-MM-DD): D, D..D, D.., ..D, >=D or <=D
    #[arg(short, long, value_parser = parse_date_range)]
    pub created: Option<DateRangeFilter>,

    /// Only accounts that accept sponsorships
    #[arg(long)]
    pub sponsorable: bool,

    /// Sort field (default: best match)
    #[arg(short, long, value_enum)]
    pub sort: Option<SortArg>,

    /// Sort order (default: desc)
    #[arg(short, long, value_enum)]
    pub order: Option<OrderArg>,

    /// Page to fetch (ignored with --all)
    #[arg(short, long)]
    pub page: Option<u32>,

    /// Results per page, 1-100 (default from config or 30)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Follow pagination until the last page
    #[arg(short, long)]
    pub all: bool,

    /// Maximum number of pages to fetch with --all
    #[arg(long, requires = "all")]
    pub max_pages: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl SearchArgs {
    /// Translate the arguments into library filters. `default_per_page`
    /// applies when `--per-page` is absent.
    pub(crate) fn to_filters(&self, default_per_page: u32) -> SearchFilters {
        SearchFilters {
            query: self.query.clone(),
            user_type: self.user_type.map(Into::into),
            search_in: self.search_in.iter().copied().map(Into::into).collect(),
            repos: self.repos,
            followers: self.followers,
            location: self.location.clone(),
            language: self.language.clone(),
            created: self.created.clone(),
            is_sponsored: self.sponsorable.then_some(true),
            sort: self.sort.map(Into::into),
            sort_order: self.order.map(Into::into),
            page: if self.all { None } else { self.page },
            per_page: Some(self.per_page.unwrap_or(default_per_page)),
        }
    }
}

/// Parse a numeric range argument.
pub(crate) fn parse_range(s: &str) -> Result<RangeFilter, String> {
    let number = |v: &str| {
        v.trim()
            .parse::<u64>()
            .map_err(|_| format!("'{}' is not a non-negative integer", v.trim()))
    };

    let s = s.trim();
    if let Some(rest) = s.strip_prefix(">=") {
        return Ok(RangeFilter::at_least(number(rest)?));
    }
    if let Some(rest) = s.strip_prefix("<=") {
        return Ok(RangeFilter::at_most(number(rest)?));
    }
    match s.split_once("..") {
        Some((min, max)) => match (min.trim().is_empty(), max.trim().is_empty()) {
            (true, true) => Err("range needs at least one bound".to_string()),
            (false, true) => Ok(RangeFilter::at_least(number(min)?)),
            (true, false) => Ok(RangeFilter::at_most(number(max)?)),
            (false, false) => Ok(RangeFilter::between(number(min)?, number(max)?)),
        },
        None => Ok(RangeFilter::exact(number(s)?)),
    }
}

/// Parse a date range argument. Dates are checked for shape only here; the
/// search itself rejects impossible calendar dates.
pub(crate) fn parse_date_range(s: &str) -> Result<DateRangeFilter, String> {
    let date = |v: &str| {
        let v = v.trim();
        let shaped = v.len() == 10
            && v.bytes()
                .enumerate()
                .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
        if shaped {
            Ok(Some(v.to_string()))
        } else {
            Err(format!("'{}' is not a YYYY-MM-DD date", v))
        }
    };

    let s = s.trim();
    if let Some(rest) = s.strip_prefix(">=") {
        return Ok(DateRangeFilter {
            from: date(rest)?,
            ..Default::default()
        });
    }
    if let Some(rest) = s.strip_prefix("<=") {
        return Ok(DateRangeFilter {
            to: date(rest)?,
            ..Default::default()
        });
    }
    match s.split_once("..") {
        Some((from, to)) => {
            let from = if from.trim().is_empty() { None } else { date(from)? };
            let to = if to.trim().is_empty() { None } else { date(to)? };
            if from.is_none() && to.is_none() {
                return Err("range needs at least one bound".to_string());
            }
            Ok(DateRangeFilter {
                from,
                to,
                exact: None,
            })
        }
        None => Ok(DateRangeFilter {
            exact: date(s)?,
            ..Default::default()
        }),
    }
}

/// One user row in table output.
#[derive(Debug, Clone, Tabled)]
struct UserRow {
    #[tabled(rename = "Login")]
    login: String,
    #[tabled(rename = "Type")]
    account_type: String,
    #[tabled(rename = "Profile")]
    html_url: String,
}

impl From<&UserRecord> for UserRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            login: user.login.clone(),
            account_type: format!("{:?}", user.account_type),
            html_url: user.html_url.clone(),
        }
    }
}

fn summary(shown: usize, metadata: &SearchMetadata) -> String {
    let mut line = format!(
        "Showing {} of {} users (page {}, {} per page)",
        shown, metadata.total_count, metadata.current_page, metadata.per_page
    );
    if metadata.incomplete_results {
        line.push_str(", results may be incomplete");
    }
    if metadata.has_next_page {
        line.push_str(", more available");
    }
    line
}

fn render(
    users: &[UserRecord],
    metadata: Option<&SearchMetadata>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(users.iter().map(UserRow::from));
            table.with(tabled::settings::Style::rounded());
            let mut out = table.to_string();
            if let Some(metadata) = metadata {
                out.push('\n');
                out.push_str(&summary(users.len(), metadata));
            }
            Ok(out)
        }
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "users": users,
            "metadata": metadata,
        })),
    }
}

/// Collect pages through `session` until it runs dry or `max_pages` pages
/// have been loaded. A cancelled run keeps what it already has.
pub(crate) async fn collect_pages(
    service: &SearchService,
    session: &mut SearchSession,
    max_pages: Option<u32>,
    cancel: &CancelToken,
) -> Result<u32, SearchError> {
    let mut loaded = 0;
    while max_pages.is_none_or(|max| loaded < max) {
        match service.load_next(session, cancel).await {
            Ok(true) => loaded += 1,
            Ok(false) => break,
            Err(SearchError::GitHub(GitHubError::Cancelled)) if loaded > 0 => {
                tracing::warn!("Cancelled after {} pages", loaded);
                break;
            }
            Err(e) => return Err(e),
        }
        tracing::debug!(pages = loaded, users = session.users().len(), "Page loaded");
    }
    Ok(loaded)
}

/// Handle the search command.
pub(crate) async fn handle_search(
    args: SearchArgs,
    config: &Config,
    cancel: CancelToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let filters = args.to_filters(config.search.per_page);
    let service = SearchService::new(GitHubClient::new(config.client_config()?)?);

    if args.all {
        let mut session = SearchSession::new(filters);
        let pages = collect_pages(&service, &mut session, args.max_pages, &cancel).await?;
        tracing::info!(pages, users = session.users().len(), "Search finished");
        println!(
            "{}",
            render(session.users(), session.metadata(), args.output)?
        );
    } else {
        let outcome = service.search(&filters, &cancel).await?;
        if let Some(rate_limit) = outcome.rate_limit {
            tracing::debug!(
                remaining = rate_limit.remaining,
                limit = rate_limit.limit,
                "Search rate limit"
            );
        }
        println!(
            "{}",
            render(
                &outcome.result.users,
                Some(&outcome.result.metadata),
                args.output
            )?
        );
    }

    Ok(())
}
