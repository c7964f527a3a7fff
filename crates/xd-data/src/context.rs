//! Per-request query context.
//!
//! A [`Context`] carries the query parameters of one request: pagination,
//! ranges, the `select` list, the `filter` expression, the `metadata`
//! category selector, the write priority and the response format. The
//! default contextualization of children, metadata and values lives here;
//! bindings may replace it per node.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::trace;
use xd_filter::{Filter, FilterError};

use crate::auth::{AllowAll, Authorizer};
use crate::base::Base;
use crate::config::Config;
use crate::error::{ErrorKind, XdError};
use crate::eval::NodeResolver;
use crate::given::Given;
use crate::meta;
use crate::rules;
use crate::string_set::StringSet;
use crate::tree::{DataTree, NodeId};
use crate::value::Value;

/// Request method a context is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

/// Response format requested with `alt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alt {
    Json,
    Xml,
    Plain,
    Media,
}

impl Alt {
    pub fn from_name(name: &str) -> Option<Alt> {
        match name {
            "json" => Some(Alt::Json),
            "xml" => Some(Alt::Xml),
            "plain" => Some(Alt::Plain),
            "media" => Some(Alt::Media),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Alt::Json => "json",
            Alt::Xml => "xml",
            Alt::Plain => "plain",
            Alt::Media => "media",
        }
    }
}

/// Where the next page of a paginated listing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextCursor {
    pub skip: i64,
    pub max_results: i64,
    /// The other parameters of the request, carried over unchanged.
    pub parameters: Vec<(String, String)>,
}

impl NextCursor {
    /// Query string for the next page, without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = self
            .parameters
            .iter()
            .filter(|(k, _)| k != "skip" && k != "max-results")
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        pairs.push(("skip", self.skip.to_string()));
        pairs.push(("max-results", self.max_results.to_string()));
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", xd_path::percent_encode(k), xd_path::percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Children that made the cut, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildList {
    pub items: Vec<NodeId>,
    /// Some children were left out.
    pub partial: bool,
    pub next: Option<NextCursor>,
}

pub struct Context {
    config: Config,
    authorizer: Arc<dyn Authorizer>,
    method: Method,
    parameters: Vec<(String, String)>,
    target: Cell<Option<NodeId>>,
    published_ge: Option<DateTime<FixedOffset>>,
    published_gt: Option<DateTime<FixedOffset>>,
    published_le: Option<DateTime<FixedOffset>>,
    published_lt: Option<DateTime<FixedOffset>>,
    sequence_ge: Option<i64>,
    sequence_gt: Option<i64>,
    sequence_le: Option<i64>,
    sequence_lt: Option<i64>,
    skip: Option<i64>,
    max_results: Option<i64>,
    depth: Option<i64>,
    descendant_depth: Option<i64>,
    priority: Option<u8>,
    reverse: Option<bool>,
    select: Option<Vec<String>>,
    filter: Option<Filter>,
    /// `None` includes every standard name.
    metadata_filter: Option<StringSet>,
    includes_extensions: bool,
    includes_definitions: bool,
    locale: Option<String>,
    alt: Alt,
    in_definition: Cell<u32>,
    pub cur_depth: Cell<i64>,
    pub cur_descendant_depth: Cell<i64>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("target", &self.target.get())
            .field("skip", &self.skip)
            .field("max_results", &self.max_results)
            .field("depth", &self.depth)
            .field("priority", &self.priority)
            .field("select", &self.select)
            .field("filter", &self.filter.as_ref().map(Filter::source))
            .field("metadata", &self.metadata_filter.as_ref().map(|m| m.to_string()))
            .field("alt", &self.alt)
            .finish()
    }
}

fn bad_number(name: &str) -> XdError {
    XdError::new(
        ErrorKind::ParamValueFormat,
        format!("query parameter {name} is not a number"),
    )
}

fn parse_int(name: &str, value: &str) -> Result<i64, XdError> {
    value.trim().parse::<i64>().map_err(|_| bad_number(name))
}

fn parse_time(name: &str, value: &str) -> Result<DateTime<FixedOffset>, XdError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| {
        XdError::new(
            ErrorKind::ParamValueFormat,
            format!("query parameter {name} is malformed"),
        )
    })
}

fn out_of_range(message: &str) -> XdError {
    XdError::new(ErrorKind::ParamOutOfRange, message)
}

fn filter_error(e: FilterError) -> XdError {
    match e {
        FilterError::Syntax(m) => XdError::new(ErrorKind::ParamSyntax, m),
        FilterError::ValueFormat(m) => XdError::new(ErrorKind::ParamValueFormat, m),
    }
}

impl Context {
    /// A context with no filtering and full authority.
    pub fn new(config: Config) -> Context {
        Context {
            config,
            authorizer: Arc::new(AllowAll),
            method: Method::Get,
            parameters: Vec::new(),
            target: Cell::new(None),
            published_ge: None,
            published_gt: None,
            published_le: None,
            published_lt: None,
            sequence_ge: None,
            sequence_gt: None,
            sequence_le: None,
            sequence_lt: None,
            skip: None,
            max_results: None,
            depth: None,
            descendant_depth: None,
            priority: None,
            reverse: None,
            select: None,
            filter: None,
            metadata_filter: None,
            includes_extensions: false,
            includes_definitions: false,
            locale: None,
            alt: Alt::Json,
            in_definition: Cell::new(0),
            cur_depth: Cell::new(0),
            cur_descendant_depth: Cell::new(0),
        }
    }

    /// Builds a context from decoded query parameters.
    pub fn from_parameters<K, V>(
        config: Config,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Context, XdError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut ctx = Context::new(config);
        ctx.metadata_filter = Some(StringSet::from_slice(rules::VALUE_METADATA));
        for (name, value) in params {
            let (name, value) = (name.as_ref(), value.as_ref());
            ctx.parameters.push((name.to_string(), value.to_string()));
            match name {
                "published-ge" => ctx.published_ge = Some(parse_time(name, value)?),
                "published-gt" => ctx.published_gt = Some(parse_time(name, value)?),
                "published-le" => ctx.published_le = Some(parse_time(name, value)?),
                "published-lt" => ctx.published_lt = Some(parse_time(name, value)?),
                "sequence-ge" => ctx.sequence_ge = Some(parse_int(name, value)?),
                "sequence-gt" => ctx.sequence_gt = Some(parse_int(name, value)?),
                "sequence-le" => ctx.sequence_le = Some(parse_int(name, value)?),
                "sequence-lt" => ctx.sequence_lt = Some(parse_int(name, value)?),
                "skip" => ctx.skip = Some(parse_int(name, value)?),
                "max-results" => ctx.max_results = Some(parse_int(name, value)?),
                "depth" => ctx.depth = Some(parse_int(name, value)?),
                "descendant-depth" => ctx.descendant_depth = Some(parse_int(name, value)?),
                "priority" => {
                    let priority = parse_int(name, value)?;
                    if !(1..=16).contains(&priority) {
                        return Err(out_of_range("Invalid 'priority' parameter value"));
                    }
                    ctx.priority = Some(priority as u8);
                }
                "reverse" => ctx.reverse = Some(value.eq_ignore_ascii_case("true")),
                "select" => ctx.select = Some(value.split(';').map(str::to_string).collect()),
                "filter" => ctx.filter = Some(Filter::parse(value).map_err(filter_error)?),
                "metadata" => ctx.parse_metadata(value)?,
                "locale" => ctx.locale = Some(value.to_string()),
                "alt" => {
                    ctx.alt = Alt::from_name(value)
                        .ok_or_else(|| out_of_range("Invalid 'alt' value"))?
                }
                _ => {}
            }
        }
        if ctx.depth.is_some_and(|d| d < 0) {
            return Err(out_of_range("Invalid 'depth' parameter value"));
        }
        if ctx.descendant_depth.is_some_and(|d| d < 0) {
            return Err(out_of_range("Invalid 'descendant-depth' parameter value"));
        }
        if ctx.skip.is_some_and(|s| s < -1) {
            return Err(out_of_range("Invalid 'skip' parameter value"));
        }
        if ctx.max_results.is_some_and(|m| m < 0) {
            return Err(out_of_range("Invalid 'max-results' parameter value"));
        }
        // only plain text responses are localized
        if ctx.alt != Alt::Plain {
            ctx.locale = None;
        }
        ctx.reset_counters();
        Ok(ctx)
    }

    /// Builds a context from a raw query string such as `skip=2&max-results=2`.
    pub fn from_query(config: Config, query: &str) -> Result<Context, XdError> {
        let mut params = Vec::new();
        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decode = |s: &str| {
                xd_path::percent_decode(s)
                    .map_err(|e| XdError::new(ErrorKind::ParamSyntax, e.to_string()))
            };
            params.push((decode(name)?, decode(value)?));
        }
        Context::from_parameters(config, params)
    }

    fn parse_metadata(&mut self, selector: &str) -> Result<(), XdError> {
        let mut selected = StringSet::from_slice(rules::ALWAYS_METADATA);
        self.includes_extensions = false;
        self.includes_definitions = false;
        for name in selector.split(',') {
            match name {
                "" => {}
                "all" | "cat-all" => {
                    selected.add_all(rules::ALL_METADATA);
                    selected.remove(meta::HISTORY);
                    self.includes_extensions = true;
                }
                "defs" => self.includes_definitions = true,
                "cat-types" => selected.add_all(rules::TYPE_METADATA),
                "cat-tags" => selected.add_all(rules::TAG_METADATA),
                "cat-links" => selected.add_all(rules::LINK_METADATA),
                "cat-ui" => selected.add_all(rules::UI_METADATA),
                "cat-doc" => selected.add_all(rules::DOC_METADATA),
                "cat-data" => selected.add_all(rules::DATA_METADATA),
                "cat-auth" => selected.add_all(rules::AUTH_METADATA),
                "cat-change" => selected.add_all(rules::CHANGE_METADATA),
                "cat-value" => selected.add_all(rules::VALUE_METADATA),
                "cat-extensions" => self.includes_extensions = true,
                _ => {
                    let (removing, bare) = match name.strip_prefix('-') {
                        Some(bare) => (true, bare),
                        None => (false, name),
                    };
                    let full = format!("${bare}");
                    if !rules::is_known_metadata(&full) {
                        return Err(out_of_range(&format!(
                            "The 'metadata' query parameter does not support \"{name}\""
                        )));
                    }
                    if removing {
                        selected.remove(&full);
                    } else {
                        selected.add(&full);
                    }
                }
            }
        }
        self.metadata_filter = Some(selected);
        Ok(())
    }

    /// Rejects parameters that make no sense for `method`.
    pub fn validate_for(&mut self, method: Method) -> Result<(), XdError> {
        self.method = method;
        let inconsistent = |m: &str| XdError::new(ErrorKind::InconsistentValues, m);
        match method {
            Method::Put => {
                if self.max_results.is_some() {
                    return Err(inconsistent("'max-results' is not allowed for PUT"));
                }
                if self.skip.is_some() && self.alt != Alt::Plain {
                    return Err(inconsistent("'skip' is only allowed for PUT with alt=plain"));
                }
            }
            Method::Post => {
                if self.max_results.is_some() || self.skip.is_some() {
                    return Err(inconsistent("'skip' and 'max-results' are not allowed for POST"));
                }
            }
            Method::Get | Method::Delete => {}
        }
        Ok(())
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Context {
        self.authorizer = authorizer;
        self
    }

    pub fn with_method(mut self, method: Method) -> Context {
        self.method = method;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Context {
        self.priority = Some(priority.clamp(1, 16));
        self
    }

    // ------------------------------------------------------------ Accessors

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0)
    }

    pub fn has_max_results(&self) -> bool {
        self.max_results.is_some()
    }

    pub fn max_results(&self) -> i64 {
        self.max_results.unwrap_or(i64::MAX)
    }

    pub fn depth(&self) -> i64 {
        self.depth.unwrap_or(i64::MAX)
    }

    pub fn descendant_depth(&self) -> i64 {
        self.descendant_depth.unwrap_or(i64::MAX)
    }

    pub fn has_priority(&self) -> bool {
        self.priority.is_some()
    }

    /// Write priority, 16 unless the request named one.
    pub fn priority(&self) -> u8 {
        self.priority.unwrap_or(16)
    }

    pub fn reverse(&self) -> bool {
        self.reverse.unwrap_or(false)
    }

    /// The request locale, or the database locale.
    pub fn locale(&self) -> &str {
        match &self.locale {
            Some(locale) if !locale.is_empty() => locale,
            _ => &self.config.locale,
        }
    }

    pub fn alt(&self) -> Alt {
        self.alt
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn can_include_definitions(&self) -> bool {
        self.includes_definitions
    }

    // ------------------------------------------------------------ Walk state

    pub fn set_target(&self, target: Option<NodeId>) {
        self.target.set(target);
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn is_target(&self, id: NodeId) -> bool {
        self.target.get() == Some(id)
    }

    /// Whether an ancestor of `id` is the target.
    pub fn is_below_target(&self, tree: &DataTree, id: NodeId) -> bool {
        let mut cur = tree.parent(id);
        while let Some(node) = cur {
            if self.is_target(node) {
                return true;
            }
            cur = tree.parent(node);
        }
        false
    }

    pub fn enter_definition_context(&self) {
        self.in_definition.set(self.in_definition.get() + 1);
    }

    pub fn exit_definition_context(&self) {
        self.in_definition.set(self.in_definition.get().saturating_sub(1));
    }

    pub fn in_definition_context(&self) -> bool {
        self.in_definition.get() != 0
    }

    pub fn can_descend(&self) -> bool {
        self.cur_depth.get() <= self.depth()
    }

    pub fn reset_counters(&self) {
        self.in_definition.set(0);
        self.cur_depth.set(0);
        self.cur_descendant_depth.set(0);
    }

    // ------------------------------------------------------------ Selection

    /// Whether a metadata item passes the `metadata` selector.
    pub fn can_include_metadata(&self, tree: &DataTree, item: NodeId) -> bool {
        if self.in_definition_context() {
            return true;
        }
        let name = tree.name(item);
        if rules::never_filtered_out(name) {
            return true;
        }
        if !self.authorizer.check_visible(tree, item) || rules::is_hidden(name) {
            return false;
        }
        if rules::is_standard(name) {
            self.metadata_filter
                .as_ref()
                .map_or(true, |selected| selected.contains(name))
        } else {
            self.includes_extensions
        }
    }

    pub fn can_include_name(&self, name: &str) -> bool {
        self.metadata_filter
            .as_ref()
            .map_or(true, |selected| selected.contains(name))
    }

    fn is_selected(&self, tree: &mut DataTree, child: NodeId) -> bool {
        let Some(select) = &self.select else {
            return true;
        };
        let name = tree.name(child).to_string();
        select.iter().any(|selector| match selector.as_str() {
            ".optional" => tree.is_optional(child),
            ".required" => !tree.is_optional(child),
            other => other == name,
        })
    }

    fn is_filtered(&self, tree: &mut DataTree, child: NodeId) -> bool {
        if self.cur_depth.get() > 1 {
            return true;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        let mut resolver = NodeResolver::new(tree, self, child);
        filter.matches(&mut resolver)
    }

    fn in_time_range(&self, tree: &mut DataTree, child: NodeId) -> Result<bool, XdError> {
        if self.published_ge.is_none()
            && self.published_gt.is_none()
            && self.published_le.is_none()
            && self.published_lt.is_none()
        {
            return Ok(true);
        }
        let stamp = match tree.find(child, meta::PUBLISHED)? {
            Some(found) => Some(found),
            None => tree.find(child, "timestamp")?,
        };
        let Some(stamp) = stamp.filter(|s| tree.base(*s) == Base::DateTime) else {
            return Ok(true);
        };
        let Some(published) = tree.datetime_value(stamp, None) else {
            return Ok(true);
        };
        Ok(!(self.published_ge.is_some_and(|t| published < t)
            || self.published_gt.is_some_and(|t| published <= t)
            || self.published_le.is_some_and(|t| published > t)
            || self.published_lt.is_some_and(|t| published >= t)))
    }

    fn in_sequence_range(&self, tree: &DataTree, child: NodeId) -> bool {
        if self.sequence_ge.is_none()
            && self.sequence_gt.is_none()
            && self.sequence_le.is_none()
            && self.sequence_lt.is_none()
        {
            return true;
        }
        let Ok(sequence) = tree.name(child).parse::<i64>() else {
            return false;
        };
        !(self.sequence_ge.is_some_and(|s| sequence < s)
            || self.sequence_gt.is_some_and(|s| sequence <= s)
            || self.sequence_le.is_some_and(|s| sequence > s)
            || self.sequence_lt.is_some_and(|s| sequence >= s))
    }

    /// Visibility, then `select`, `filter` and the ranges for the target's
    /// own children.
    pub fn can_include_child(&self, tree: &mut DataTree, child: NodeId) -> Result<bool, XdError> {
        if self.in_definition_context() {
            return Ok(true);
        }
        if !self.authorizer.check_visible(tree, child) || rules::is_hidden(tree.name(child)) {
            return Ok(false);
        }
        let under_target = tree.parent(child).is_some_and(|p| self.is_target(p));
        if under_target {
            if !self.is_selected(tree, child) || !self.is_filtered(tree, child) {
                return Ok(false);
            }
            if !self.in_time_range(tree, child)? || !self.in_sequence_range(tree, child) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn next_cursor(&self) -> NextCursor {
        let max_results = self.max_results.unwrap_or(0);
        NextCursor {
            skip: self.skip() + max_results,
            max_results: max_results.max(1),
            parameters: self.parameters.clone(),
        }
    }

    /// Applies selection and pagination to `candidates`. Only the target's
    /// children are filtered and paged; elsewhere just visibility applies.
    pub fn filter_children(
        &self,
        tree: &mut DataTree,
        candidates: Vec<NodeId>,
        is_target: bool,
    ) -> Result<ChildList, XdError> {
        let mut list = ChildList::default();
        let mut skip = self.skip();
        let mut max = self.max_results();
        for candidate in candidates {
            // invisible and hidden children do not make a list partial
            if !self.authorizer.check_visible(tree, candidate) || rules::is_hidden(tree.name(candidate)) {
                continue;
            }
            if !is_target {
                list.items.push(candidate);
                continue;
            }
            if !self.can_include_child(tree, candidate)? {
                trace!(name = tree.name(candidate), "child filtered out");
                list.partial = true;
                continue;
            }
            if skip > 0 {
                skip -= 1;
                list.partial = true;
                continue;
            }
            if max == 0 {
                list.next = Some(self.next_cursor());
                list.partial = true;
                break;
            }
            list.items.push(candidate);
            max -= 1;
            if max == 0 {
                list.next = Some(self.next_cursor());
                list.partial = true;
                break;
            }
        }
        Ok(list)
    }

    /// Default listing of a node's children.
    pub fn make_contextualized_children(
        &self,
        tree: &mut DataTree,
        id: NodeId,
    ) -> Result<ChildList, XdError> {
        let mut children = tree.children(id)?;
        if self.reverse() {
            children.reverse();
        }
        self.filter_children(tree, children, self.is_target(id))
    }

    /// Default listing of a node's metadata.
    pub fn make_contextualized_metadata(
        &self,
        tree: &mut DataTree,
        id: NodeId,
    ) -> Result<Vec<NodeId>, XdError> {
        let metadata = tree.metadata(id)?;
        if self.in_definition_context() {
            return Ok(metadata);
        }
        Ok(metadata
            .into_iter()
            .filter(|m| self.can_include_metadata(tree, *m))
            .collect())
    }

    /// Default text of a node's value. A plain-text GET of a string or
    /// octet string target may ask for a range with `skip`/`max-results`.
    pub fn make_contextualized_value(
        &self,
        tree: &mut DataTree,
        id: NodeId,
    ) -> Result<Option<String>, XdError> {
        let value = tree.value(id)?;
        let ranged = self.is_target(id)
            && self.alt == Alt::Plain
            && self.method == Method::Get
            && (self.skip.is_some() || self.max_results.is_some());
        let Some(value) = value else {
            return Ok(None);
        };
        if !ranged {
            return Ok(Some(value.to_string()));
        }
        let range = |len: usize| -> Result<(usize, usize), XdError> {
            let from = self.skip();
            if from < 0 {
                return Err(out_of_range("'skip' cannot be negative"));
            }
            let from = (from as usize).min(len);
            let to = match self.max_results {
                Some(max) => from.saturating_add(max as usize).min(len),
                None => len,
            };
            Ok((from, to))
        };
        Ok(Some(match (tree.base(id), value) {
            (Base::OctetString, Value::Octets(bytes)) => {
                let (from, to) = range(bytes.len())?;
                Value::Octets(bytes[from..to].to_vec()).to_string()
            }
            (Base::String, Value::Text(text)) => {
                let chars: Vec<char> = text.chars().collect();
                let (from, to) = range(chars.len())?;
                chars[from..to].iter().collect()
            }
            (_, value) => value.to_string(),
        }))
    }
}

impl DataTree {
    /// Children as this request sees them. A binding may supply its own
    /// listing.
    pub fn contextualized_children(&mut self, ctx: &Context, id: NodeId) -> Result<ChildList, XdError> {
        self.preread(id)?;
        if let Some(binding) = self.local_binding(id) {
            if let Some(list) = binding.contextualized_children(self, ctx, id)? {
                return Ok(list);
            }
        }
        ctx.make_contextualized_children(self, id)
    }

    pub fn contextualized_metadata(&mut self, ctx: &Context, id: NodeId) -> Result<Vec<NodeId>, XdError> {
        self.preread(id)?;
        if let Some(binding) = self.local_binding(id) {
            if let Some(list) = binding.contextualized_metadata(self, ctx, id)? {
                return Ok(list);
            }
        }
        ctx.make_contextualized_metadata(self, id)
    }

    pub fn contextualized_value(&mut self, ctx: &Context, id: NodeId) -> Result<Option<String>, XdError> {
        self.preread(id)?;
        if let Some(binding) = self.local_binding(id) {
            if let Some(value) = binding.contextualized_value(self, ctx, id)? {
                return Ok(Some(value));
            }
        }
        ctx.make_contextualized_value(self, id)
    }

    /// Snapshot of `id` shaped by the request: metadata by category,
    /// children filtered and paged at the target, descent bounded by
    /// `depth`.
    pub fn to_given_in(&mut self, ctx: &Context, id: NodeId) -> Result<Given, XdError> {
        let mut given = Given::new(self.name(id), self.base(id));
        if ctx.can_include_name(meta::VALUE) || ctx.is_target(id) {
            if let Some(text) = self.contextualized_value(ctx, id)? {
                given.value = Some(Value::Text(text).conform(self.base(id))?);
            }
        }
        for item in self.contextualized_metadata(ctx, id)? {
            given.metadata.push(self.to_given(item)?);
        }
        ctx.cur_depth.set(ctx.cur_depth.get() + 1);
        let below = self.children_given_in(ctx, id, given);
        ctx.cur_depth.set(ctx.cur_depth.get() - 1);
        below
    }

    fn children_given_in(&mut self, ctx: &Context, id: NodeId, mut given: Given) -> Result<Given, XdError> {
        if !ctx.can_descend() {
            if !self.children(id)?.is_empty() {
                given = given.truncated();
            }
            return Ok(given);
        }
        let list = self.contextualized_children(ctx, id)?;
        for child in list.items {
            given.children.push(self.to_given_in(ctx, child)?);
        }
        if list.partial {
            given = given.partial();
        }
        if let Some(next) = list.next {
            let link = Given::new(meta::NEXT, Base::Link).with_value(format!("?{}", next.to_query()));
            given = given.with_meta(link);
        }
        Ok(given)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Result<Context, XdError> {
        Context::from_parameters(Config::default(), pairs.iter().copied())
    }

    #[test]
    fn test_parameter_errors() {
        assert_eq!(params(&[("skip", "x")]).unwrap_err().kind, ErrorKind::ParamValueFormat);
        assert_eq!(params(&[("skip", "-2")]).unwrap_err().kind, ErrorKind::ParamOutOfRange);
        assert_eq!(params(&[("priority", "17")]).unwrap_err().kind, ErrorKind::ParamOutOfRange);
        assert_eq!(params(&[("alt", "csv")]).unwrap_err().kind, ErrorKind::ParamOutOfRange);
        assert_eq!(params(&[("metadata", "bogus")]).unwrap_err().kind, ErrorKind::ParamOutOfRange);
        assert_eq!(params(&[("filter", "a eq")]).unwrap_err().kind, ErrorKind::ParamSyntax);
        assert_eq!(
            params(&[("published-ge", "yesterday")]).unwrap_err().kind,
            ErrorKind::ParamValueFormat
        );
    }

    #[test]
    fn test_locale_only_for_plain() {
        let ctx = params(&[("locale", "fr-FR")]).unwrap();
        assert_eq!(ctx.locale(), "en-US");
        let ctx = params(&[("locale", "fr-FR"), ("alt", "plain")]).unwrap();
        assert_eq!(ctx.locale(), "fr-FR");
    }

    #[test]
    fn test_validate_for_method() {
        let mut ctx = params(&[("max-results", "3")]).unwrap();
        assert_eq!(ctx.validate_for(Method::Put).unwrap_err().kind, ErrorKind::InconsistentValues);
        let mut ctx = params(&[("skip", "3"), ("alt", "plain")]).unwrap();
        assert!(ctx.validate_for(Method::Put).is_ok());
        assert_eq!(ctx.validate_for(Method::Post).unwrap_err().kind, ErrorKind::InconsistentValues);
    }

    #[test]
    fn test_metadata_selector() {
        let ctx = params(&[]).unwrap();
        assert!(ctx.can_include_name(meta::PRIORITY_ARRAY));
        assert!(!ctx.can_include_name(meta::DISPLAY_NAME));
        let ctx = params(&[("metadata", "cat-ui")]).unwrap();
        assert!(ctx.can_include_name(meta::DISPLAY_NAME));
        assert!(ctx.can_include_name(meta::SELF));
        let ctx = params(&[("metadata", "all,-displayName")]).unwrap();
        assert!(!ctx.can_include_name(meta::DISPLAY_NAME));
        assert!(!ctx.can_include_name(meta::HISTORY));
        assert!(ctx.can_include_name(meta::UNITS));
    }

    #[test]
    fn test_next_cursor_query() {
        let cursor = NextCursor {
            skip: 4,
            max_results: 2,
            parameters: vec![
                ("skip".to_string(), "2".to_string()),
                ("filter".to_string(), "a eq 1".to_string()),
            ],
        };
        assert_eq!(cursor.to_query(), "filter=a+eq+1&skip=4&max-results=2");
    }

    #[test]
    fn test_plain_substring() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let text = tree.set(root, "text", "abcdef").unwrap();
        let ctx = params(&[("alt", "plain"), ("skip", "2"), ("max-results", "3")]).unwrap();
        ctx.set_target(Some(text));
        assert_eq!(tree.contextualized_value(&ctx, text).unwrap().as_deref(), Some("cde"));
        ctx.set_target(None);
        assert_eq!(tree.contextualized_value(&ctx, text).unwrap().as_deref(), Some("abcdef"));
    }
}
