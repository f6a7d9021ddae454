//! # Query Control
//!
//! Edits a structured content query. Every field writes through
//! [`update_query`], which drops empty values and resets fields that depend
//! on the one being changed:
//!
//! ```text
//!   objectType ─► everything else is discarded
//!   post_type  ─► post__in / post__not_in are discarded,
//!                 deferred post and term pickers re-fetch
//! ```
//!
//! The meta and taxonomy repeaters drop a row once its required key is
//! cleared.

use super::{object_or_empty, set_or_remove, str_field, truthy};
use crate::context::ControlContext;
use crate::dropdown::{selected_values, value_text, Dropdown, DropdownAction, SelectOption};
use crate::effect::{Effect, Effects};
use crate::error::{ControlError, ControlResult};
use crate::node::ControlNode;
use crate::primitives;
use blocks_schema::PropertyDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::time::Instant;
use tracing::debug;

const SUMMARY_KEYS: usize = 5;

const POST_ORDERBY: [(&str, &str); 13] = [
    ("date", "date"),
    ("title", "title"),
    ("menu_order", "menuOrder"),
    ("rand", "random"),
    ("ID", "id"),
    ("author", "author"),
    ("modified", "modified"),
    ("parent", "parent"),
    ("comment_count", "commentCount"),
    ("meta_value", "metaValue"),
    ("meta_value_num", "metaValueNum"),
    ("name", "name"),
    ("type", "type"),
];

const TERM_ORDERBY: [(&str, &str); 8] = [
    ("name", "name"),
    ("slug", "slug"),
    ("term_group", "termGroup"),
    ("term_id", "termId"),
    ("id", "ID"),
    ("description", "description"),
    ("parent", "parent"),
    ("count", "count"),
];

const USER_ORDERBY: [(&str, &str); 10] = [
    ("login", "login"),
    ("nicename", "nicename"),
    ("email", "email"),
    ("url", "URL"),
    ("registered", "registered"),
    ("display_name", "displayName"),
    ("post_count", "postCount"),
    ("ID", "ID"),
    ("meta_value", "metaValue"),
    ("meta_value_num", "metaValueNum"),
];

const ORDER: [(&str, &str); 2] = [("ASC", "ascending"), ("DESC", "descending")];

const META_COMPARE: [(&str, &str); 14] = [
    ("=", "equal"),
    ("!=", "notEqual"),
    (">", "greaterThan"),
    (">=", "greaterThanOrEqual"),
    ("<", "lesserThan"),
    ("<=", "lesserOrEqual"),
    ("LIKE", "like"),
    ("NOT LIKE", "notLike"),
    ("IN", "in"),
    ("NOT IN", "notIn"),
    ("BETWEEN", "between"),
    ("NOT BETWEEN", "notBetween"),
    ("EXISTS", "exists"),
    ("NOT EXISTS", "notExists"),
];

const META_TYPES: [(&str, &str); 9] = [
    ("CHAR", "char"),
    ("NUMERIC", "numeric"),
    ("BINARY", "binary"),
    ("DATE", "date"),
    ("DATETIME", "datetime"),
    ("DECIMAL", "decimal"),
    ("SIGNED", "signed"),
    ("TIME", "time"),
    ("UNSIGNED", "unsigned"),
];

const TAX_OPERATORS: [(&str, &str); 5] = [
    ("IN", "in"),
    ("NOT IN", "notIn"),
    ("AND", "and"),
    ("EXISTS", "exists"),
    ("NOT EXISTS", "notExists"),
];

const TAX_FIELDS: [(&str, &str); 4] = [
    ("term_id", "termId"),
    ("name", "name"),
    ("slug", "slug"),
    ("term_taxonomy_id", "termTaxonomyId"),
];

const AJAX_LOADER_ANIMATIONS: [(&str, &str); 8] = [
    ("default", "default"),
    ("ellipsis", "ellipsis"),
    ("ring", "ring"),
    ("dual-ring", "dualRing"),
    ("facebook", "facebook"),
    ("roller", "roller"),
    ("ripple", "ripple"),
    ("spinner", "spinner"),
];

const WOO_TOGGLES: [(&str, &str); 7] = [
    ("onSale", "onSaleProductsOnly"),
    ("featured", "featuredProductsOnly"),
    ("hideOutOfStock", "hideOutOfStock"),
    ("relatedProducts", "relatedProducts"),
    ("upSells", "upSells"),
    ("crossSells", "crossSells"),
    ("cartCrossSells", "cartCrossSells"),
];

/// Integer-valued fields
const INTEGER_FIELDS: [&str; 9] = [
    "posts_per_page",
    "number",
    "offset",
    "post_parent",
    "parent",
    "child_of",
    "randomSeedTtl",
    "infinite_scroll_margin",
    "infinite_scroll_delay",
];

const FLOAT_FIELDS: [&str; 1] = ["ajax_loader_scale"];

/// Pickers whose options come from the server
const DEFERRED_PICKERS: [&str; 4] = ["post__in", "post__not_in", "tax_query", "tax_query_not"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Post,
    Term,
    User,
}

impl ObjectType {
    /// Absent object type means posts
    pub fn of(query: &Map<String, Value>) -> ObjectType {
        match str_field(query, "objectType") {
            "term" => ObjectType::Term,
            "user" => ObjectType::User,
            _ => ObjectType::Post,
        }
    }

    fn orderby(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ObjectType::Post => &POST_ORDERBY,
            ObjectType::Term => &TERM_ORDERBY,
            ObjectType::User => &USER_ORDERBY,
        }
    }
}

/// Repeater sections of the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Repeater {
    Meta,
    Tax,
}

impl Repeater {
    pub fn key(self) -> &'static str {
        match self {
            Repeater::Meta => "meta_query",
            Repeater::Tax => "tax_query_advanced",
        }
    }

    /// Field a row cannot exist without
    fn required(self) -> &'static str {
        match self {
            Repeater::Meta => "key",
            Repeater::Tax => "taxonomy",
        }
    }

    fn relation_key(self) -> &'static str {
        match self {
            Repeater::Meta => "meta_query_relation",
            Repeater::Tax => "tax_query_relation",
        }
    }

    /// Row added by the "add" button
    pub fn template(self) -> Value {
        match self {
            Repeater::Meta => serde_json::json!({ "key": "", "value": "", "compare": "=", "type": "CHAR" }),
            Repeater::Tax => serde_json::json!({
                "taxonomy": "",
                "field": "term_id",
                "terms": "",
                "operator": "IN",
                "include_children": true
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum QueryAction {
    Set { key: String, value: Value },
    /// Raw number input; unparsable text clears the key
    SetNumber { key: String, value: String },
    Picker { field: String, action: DropdownAction },
    AddRow(Repeater),
    UpdateRow { repeater: Repeater, index: usize, field: String, value: Value },
    RemoveRow { repeater: Repeater, index: usize },
    ClearAll,
}

/// Query after setting `key`
///
/// Empty values (and `false`) remove the key. Changing `objectType` keeps
/// only the new object type; changing `post_type` drops the post lists.
pub fn update_query(query: &Map<String, Value>, key: &str, value: Value) -> Map<String, Value> {
    if key == "objectType" {
        let mut next = Map::new();
        set_or_remove(&mut next, key, value);
        return next;
    }

    let mut next = query.clone();
    set_or_remove(&mut next, key, value);
    if key == "post_type" {
        next.remove("post__in");
        next.remove("post__not_in");
    }
    next
}

/// Parsed number input for `key`, `None` when it does not parse
pub fn parse_number(key: &str, text: &str) -> Option<Value> {
    let text = text.trim();
    if FLOAT_FIELDS.contains(&key) {
        return text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number);
    }
    text.parse::<i64>().ok().map(Value::from)
}

fn rows(query: &Map<String, Value>, repeater: Repeater) -> Vec<Value> {
    query
        .get(repeater.key())
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub fn add_row(query: &Map<String, Value>, repeater: Repeater) -> Map<String, Value> {
    let mut rows = rows(query, repeater);
    rows.push(repeater.template());
    update_query(query, repeater.key(), Value::Array(rows))
}

/// Set one field of a row, dropping rows that lost their required key
///
/// `index` may name the slot just past the last row, which appends. Any
/// further index leaves the query untouched.
pub fn update_row(
    query: &Map<String, Value>,
    repeater: Repeater,
    index: usize,
    field: &str,
    value: Value,
) -> Map<String, Value> {
    let mut rows = rows(query, repeater);
    if index > rows.len() {
        return query.clone();
    }
    if index == rows.len() {
        rows.push(Value::Object(Map::new()));
    }
    if let Some(row) = rows[index].as_object_mut() {
        if value.is_null() || value == Value::String(String::new()) {
            row.remove(field);
        } else {
            row.insert(field.to_string(), value);
        }
    }

    let required = repeater.required();
    rows.retain(|row| row.as_object().map_or(false, |row| truthy(row.get(required))));
    update_query(query, repeater.key(), Value::Array(rows))
}

pub fn remove_row(query: &Map<String, Value>, repeater: Repeater, index: usize) -> Map<String, Value> {
    let mut rows = rows(query, repeater);
    if index < rows.len() {
        rows.remove(index);
    }
    update_query(query, repeater.key(), Value::Array(rows))
}

/// First few parameters as `key: json`, with a count of the rest
pub fn summary(query: &Map<String, Value>) -> String {
    let shown: Vec<String> = query
        .iter()
        .filter(|(_, value)| !matches!(value, Value::String(text) if text.is_empty()) && !value.is_null())
        .take(SUMMARY_KEYS)
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();

    let mut text = shown.join(", ");
    if query.len() > SUMMARY_KEYS {
        text.push_str(&format!(" (+{} more)", query.len() - SUMMARY_KEYS));
    }
    text
}

fn options(pairs: &[(&str, &'static str)], ctx: &ControlContext<'_>) -> Vec<SelectOption> {
    pairs
        .iter()
        .map(|&(value, label_key)| SelectOption::new(value, ctx.t(label_key)))
        .collect()
}

fn post_types(query: &Map<String, Value>) -> Vec<String> {
    selected_values(query.get("post_type"))
}

fn post_descriptor(query: &Map<String, Value>) -> Map<String, Value> {
    let types = post_types(query);
    let mut descriptor = Map::new();
    descriptor.insert("action".to_string(), Value::from("bricks_get_posts"));
    descriptor.insert(
        "postType".to_string(),
        if types.is_empty() {
            Value::from("any")
        } else {
            Value::from(types)
        },
    );
    descriptor.insert("addLanguageToPostTitle".to_string(), Value::from("true"));
    descriptor
}

fn term_descriptor(query: &Map<String, Value>, post_id: Option<&Value>) -> Map<String, Value> {
    let mut types = post_types(query);
    if types.is_empty() {
        types.push("any".to_string());
    }
    let mut descriptor = Map::new();
    descriptor.insert("action".to_string(), Value::from("bricks_get_terms_options"));
    descriptor.insert("addLanguageToTermName".to_string(), Value::from("true"));
    descriptor.insert("postTypes".to_string(), Value::from(types));
    if let Some(post_id) = post_id {
        descriptor.insert("postId".to_string(), post_id.clone());
    }
    descriptor.insert("bricks-is-builder".to_string(), Value::from("1"));
    descriptor
}

/// Whether a picker is shown for this query
fn picker_visible(field: &str, query: &Map<String, Value>) -> bool {
    let object_type = ObjectType::of(query);
    match field {
        "post_type" | "post__in" | "post__not_in" => object_type == ObjectType::Post,
        "taxonomy" => object_type == ObjectType::Term,
        "role__in" => object_type == ObjectType::User,
        "tax_query" | "tax_query_not" => object_type != ObjectType::User,
        "no_results_template" => !truthy(query.get("no_results_text")),
        _ => true,
    }
}

#[derive(Debug, Clone)]
pub struct QueryControl {
    property: PropertyDefinition,
    pickers: Vec<Dropdown>,
    post_id: Option<Value>,
}

impl QueryControl {
    pub fn new(property: PropertyDefinition, ctx: &ControlContext<'_>) -> Self {
        let id = property.id.clone();
        let settings = ctx.settings;
        let host = ctx.host;
        let empty = Map::new();

        let static_picker = |field: &str, label: &str, options: Vec<SelectOption>| {
            Dropdown::new(id.clone(), field, options, settings).with_label(label)
        };

        let mut post_type_options = vec![SelectOption::new("any", ctx.t("any"))];
        post_type_options.extend(host.post_types.iter().map(|(value, label)| SelectOption::new(value.clone(), label.clone())));
        let taxonomy_options = host
            .taxonomy_options()
            .into_iter()
            .map(|(value, label)| SelectOption::new(value, label))
            .collect();
        let role_options = host
            .user_roles
            .iter()
            .map(|(value, label)| SelectOption::new(value.clone(), label.clone()))
            .collect();
        let template_options = host
            .section_templates
            .iter()
            .map(|(value, label)| SelectOption::new(value.clone(), label.clone()))
            .collect();

        let pickers = vec![
            static_picker(
                "objectType",
                ctx.t("queryType"),
                vec![
                    SelectOption::new("post", ctx.t("post")),
                    SelectOption::new("term", ctx.t("term")),
                    SelectOption::new("user", ctx.t("user")),
                ],
            )
            .with_placeholder(ctx.t("post")),
            static_picker("post_type", ctx.t("postTypes"), post_type_options).multiple(true),
            static_picker("taxonomy", ctx.t("taxonomy"), taxonomy_options)
                .multiple(true)
                .with_placeholder(ctx.t("selectTaxonomies")),
            static_picker("role__in", ctx.t("userRoles"), role_options).multiple(true),
            static_picker("post__in", ctx.t("includePosts"), Vec::new())
                .multiple(true)
                .deferred(post_descriptor(&empty)),
            static_picker("post__not_in", ctx.t("excludePosts"), Vec::new())
                .multiple(true)
                .deferred(post_descriptor(&empty)),
            static_picker("tax_query", ctx.t("includeTerms"), Vec::new())
                .multiple(true)
                .deferred(term_descriptor(&empty, host.post_id.as_ref())),
            static_picker("tax_query_not", ctx.t("excludeTerms"), Vec::new())
                .multiple(true)
                .deferred(term_descriptor(&empty, host.post_id.as_ref())),
            static_picker("no_results_template", ctx.t("template"), template_options)
                .searchable(true)
                .with_placeholder(ctx.t("selectTemplate")),
        ];

        Self {
            property,
            pickers,
            post_id: host.post_id.clone(),
        }
    }

    fn current(&self, value: Option<&Value>) -> ControlResult<Map<String, Value>> {
        object_or_empty(value, &self.property.id, "query")
    }

    pub fn property(&self) -> &PropertyDefinition {
        &self.property
    }

    pub fn picker(&self, field: &str) -> Option<&Dropdown> {
        self.pickers.iter().find(|picker| picker.field() == field)
    }

    fn picker_mut(&mut self, field: &str) -> ControlResult<&mut Dropdown> {
        let property_id = self.property.id.clone();
        self.pickers
            .iter_mut()
            .find(|picker| picker.field() == field)
            .ok_or(ControlError::InvalidValue {
                property_id,
                expected: "query picker field",
            })
    }

    /// Point deferred pickers at the current post types and fetch the visible ones
    fn refresh_deferred(&mut self, query: &Map<String, Value>) -> Effects {
        let mut effects = Vec::new();
        for picker in self.pickers.iter_mut() {
            let field = picker.field().to_string();
            if !DEFERRED_PICKERS.contains(&field.as_str()) {
                continue;
            }
            let descriptor = if field.starts_with("post") {
                post_descriptor(query)
            } else {
                term_descriptor(query, self.post_id.as_ref())
            };
            picker.set_descriptor(Some(descriptor));
            if picker_visible(&field, query) {
                effects.extend(picker.reload(query.get(&field)).map(Effect::Fetch));
            }
        }
        effects
    }

    pub fn mount(&mut self, value: Option<&Value>) -> ControlResult<Effects> {
        let query = self.current(value)?;
        Ok(self.refresh_deferred(&query))
    }

    pub fn handle(&mut self, action: QueryAction, value: Option<&Value>, now: Instant) -> ControlResult<Effects> {
        let query = self.current(value)?;

        let next = match action {
            QueryAction::Set { key, value } => update_query(&query, &key, value),
            QueryAction::SetNumber { key, value } => {
                let number = parse_number(&key, &value).unwrap_or(Value::Null);
                update_query(&query, &key, number)
            }
            QueryAction::Picker { field, action } => {
                let picked = self.picker_mut(&field)?.apply(action, query.get(&field), now);
                match picked {
                    Some(picked) => update_query(&query, &field, picked),
                    None => return Ok(Vec::new()),
                }
            }
            QueryAction::AddRow(repeater) => add_row(&query, repeater),
            QueryAction::UpdateRow {
                repeater,
                index,
                field,
                value,
            } => {
                let len = rows(&query, repeater).len();
                if index > len {
                    return Err(ControlError::OutOfRange {
                        property_id: self.property.id.clone(),
                        index,
                        len,
                    });
                }
                update_row(&query, repeater, index, &field, value)
            }
            QueryAction::RemoveRow { repeater, index } => {
                let len = rows(&query, repeater).len();
                if index >= len {
                    return Err(ControlError::OutOfRange {
                        property_id: self.property.id.clone(),
                        index,
                        len,
                    });
                }
                remove_row(&query, repeater, index)
            }
            QueryAction::ClearAll => Map::new(),
        };

        let mut effects = Vec::new();
        let scope_changed =
            query.get("objectType") != next.get("objectType") || query.get("post_type") != next.get("post_type");
        if scope_changed {
            debug!(property_id = %self.property.id, "Query scope changed, refreshing pickers");
            effects.extend(self.refresh_deferred(&next));
        }
        effects.insert(0, Effect::Write(Value::Object(next)));
        Ok(effects)
    }

    pub fn poll(&mut self, now: Instant, value: Option<&Value>) -> Effects {
        let query = value.and_then(Value::as_object).cloned().unwrap_or_default();
        self.pickers
            .iter_mut()
            .filter_map(|picker| {
                let current = query.get(picker.field()).cloned();
                picker.poll(now, current.as_ref())
            })
            .map(Effect::Fetch)
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pickers.iter().filter_map(Dropdown::next_deadline).min()
    }

    pub fn fetch_completed(&mut self, field: &str, seq: u64, result: ControlResult<Vec<SelectOption>>) -> bool {
        match self.pickers.iter_mut().find(|picker| picker.field() == field) {
            Some(picker) => picker.fetch_completed(seq, result),
            None => false,
        }
    }

    pub fn unmount(&mut self) {
        for picker in self.pickers.iter_mut() {
            picker.unmount();
        }
    }

    pub fn render(&self, value: Option<&Value>, ctx: &ControlContext<'_>) -> ControlResult<ControlNode> {
        let query = self.current(value)?;
        let object_type = ObjectType::of(&query);
        let is_post = object_type == ObjectType::Post;
        let is_term = object_type == ObjectType::Term;
        let is_user = object_type == ObjectType::User;
        let orderby = str_field(&query, "orderby");

        let mut fields: Vec<ControlNode> = Vec::new();
        fields.extend(self.picker_node("objectType", &query, ctx));
        fields.extend(self.picker_node("post_type", &query, ctx));
        if is_post && post_types(&query).iter().any(|kind| kind == "attachment") {
            fields.push(
                text_field("post_mime_type", ctx.t("mimeType"), &query, Some("image"))
                    .with_attr("help", ctx.t("mimeTypeDesc")),
            );
        }
        fields.extend(self.picker_node("taxonomy", &query, ctx));
        fields.extend(self.picker_node("role__in", &query, ctx));

        fields.push(
            primitives::select_input(
                "orderby",
                ctx.t("orderBy"),
                orderby,
                Some(ctx.t("default")),
                &options(object_type.orderby(), ctx),
            )
            .with_attr("data-action", "set"),
        );
        if orderby == "meta_value" || orderby == "meta_value_num" {
            fields.push(text_field("meta_key", ctx.t("metaKey"), &query, Some("custom_field_key")));
        }
        if orderby == "rand" && is_post {
            fields.push(number_field("randomSeedTtl", ctx.t("randomSeedTtl"), &query).with_attr("help", ctx.t("howLongToKeep")));
        }
        fields.push(
            primitives::select_input("order", ctx.t("order"), str_field(&query, "order"), Some(ctx.t("default")), &options(&ORDER, ctx))
                .with_attr("data-action", "set"),
        );

        if is_post {
            fields.push(number_field("posts_per_page", ctx.t("postsPerPage"), &query));
        }
        if is_term || is_user {
            fields.push(number_field("number", ctx.t("number"), &query));
        }
        fields.push(number_field("offset", ctx.t("offset"), &query));
        if is_post {
            fields.push(number_field("post_parent", &format!("{} ({})", ctx.t("childOf"), ctx.t("postParentId")), &query));
        }
        if is_term {
            fields.push(number_field("parent", ctx.t("parentTerm"), &query));
            fields.push(number_field("child_of", ctx.t("childOf"), &query));
            fields.push(check_field("current_post_term", ctx.t("currentPostTerm"), &query));
        }
        if is_user {
            fields.push(check_field("current_post_author", ctx.t("currentPostAuthor"), &query));
        }
        if is_term {
            fields.push(check_field("childless", ctx.t("childlessTermsOnly"), &query));
        }
        if is_post {
            fields.push(check_field("ignore_sticky_posts", ctx.t("ignoreStickyPosts"), &query));
        }
        fields.push(check_field("disable_query_merge", ctx.t("disableQueryMerge"), &query));
        if is_post {
            fields.push(check_field("is_archive_main_query", ctx.t("isArchiveMainQuery"), &query));
        }
        fields.extend(self.picker_node("post__in", &query, ctx));
        fields.extend(self.picker_node("post__not_in", &query, ctx));
        if is_post {
            fields.push(check_field("exclude_current_post", ctx.t("excludeCurrentPost"), &query));
        }
        if is_term {
            fields.push(check_field("show_empty", ctx.t("showEmptyTerms"), &query));
        }
        fields.extend(self.picker_node("tax_query", &query, ctx));
        fields.extend(self.picker_node("tax_query_not", &query, ctx));

        if is_post && post_types(&query).iter().any(|kind| kind == "product") {
            let woo = WOO_TOGGLES
                .into_iter()
                .fold(primitives::section("woo", "WooCommerce"), |section, (key, label_key)| {
                    section.with_child(check_field(key, ctx.t(label_key), &query))
                });
            fields.push(woo);
        }

        fields.push(self.render_repeater(Repeater::Meta, &query, ctx));
        if is_post {
            fields.push(self.render_repeater(Repeater::Tax, &query, ctx));
        }

        let mut infinite = primitives::section("infinite-scroll", ctx.t("infiniteScroll"))
            .with_child(check_field("infinite_scroll", ctx.t("infiniteScroll"), &query));
        if truthy(query.get("infinite_scroll")) {
            infinite = infinite
                .with_child(number_field(
                    "infinite_scroll_margin",
                    &format!("{}: {}", ctx.t("infiniteScroll"), ctx.t("offset")),
                    &query,
                ))
                .with_child(number_field(
                    "infinite_scroll_delay",
                    &format!("{}: {} (ms)", ctx.t("infiniteScroll"), ctx.t("delay")),
                    &query,
                ));
        }
        fields.push(infinite);

        fields.push(
            primitives::section("query-filters", ctx.t("queryFilters")).with_child(
                check_field("disable_url_params", ctx.t("disableUrlParamsFilter"), &query)
                    .with_attr("help", ctx.t("disableUrlParamsFilterDesc")),
            ),
        );

        let mut live = primitives::section("live-search", ctx.t("liveSearch"))
            .with_child(check_field("is_live_search", ctx.t("liveSearch"), &query).with_attr("help", ctx.t("enableLiveSearch")));
        if truthy(query.get("is_live_search")) {
            if !truthy(query.get("is_live_search_wrapper_selector")) {
                live = live.with_child(primitives::notice("live-search-info", "info", ctx.t("liveSearchInfo")));
            }
            live = live.with_child(
                text_field("is_live_search_wrapper_selector", ctx.t("liveSearchWrapperSelector"), &query, None)
                    .with_attr("help", ctx.t("liveSearchWrapperSelectorDesc")),
            );
        }
        fields.push(live);

        let animation = str_field(&query, "ajax_loader_animation");
        let mut loader = primitives::section("ajax-loader", ctx.t("ajaxLoader")).with_child(
            primitives::select_input(
                "ajax_loader_animation",
                ctx.t("ajaxLoaderAnimation"),
                animation,
                Some(ctx.t("none")),
                &options(&AJAX_LOADER_ANIMATIONS, ctx),
            )
            .with_attr("data-action", "set")
            .with_attr("help", ctx.t("ajaxLoaderDesc")),
        );
        if !animation.is_empty() && animation != "none" {
            loader = loader
                .with_child(text_field("ajax_loader_color", ctx.t("color"), &query, None))
                .with_child(number_field("ajax_loader_scale", ctx.t("scale"), &query))
                .with_child(text_field("ajax_loader_selector", ctx.t("ajaxLoaderSelector"), &query, None));
        }
        fields.push(loader);

        let mut no_results = primitives::section("no-results", ctx.t("noResults"));
        if let Some(node) = self.picker_node("no_results_template", &query, ctx) {
            no_results = no_results.with_child(node);
        }
        if !truthy(query.get("no_results_template")) {
            no_results = no_results.with_child(text_field("no_results_text", ctx.t("text"), &query, None));
        }
        fields.push(no_results);

        let mut root = primitives::base_control(&self.property.id, &self.property.label, self.property.help.as_deref())
            .with_child(primitives::panel("query-panel", ctx.t("querySettings")).with_children(fields));

        if !query.is_empty() {
            let text = summary(&query);
            let text = if text.is_empty() { ctx.t("defaultQuery").to_string() } else { text };
            root = root.with_child(
                ControlNode::element("div")
                    .with_key("query-preview")
                    .with_child(ControlNode::element("span").with_key("preview").with_child(ControlNode::text(text)))
                    .with_child(primitives::button("clear", "clearAll", ctx.t("clearAll"))),
            );
        }
        Ok(root)
    }

    fn picker_node(&self, field: &str, query: &Map<String, Value>, ctx: &ControlContext<'_>) -> Option<ControlNode> {
        if !picker_visible(field, query) {
            return None;
        }
        self.picker(field).map(|picker| picker.render(query.get(field), ctx))
    }

    fn render_repeater(&self, repeater: Repeater, query: &Map<String, Value>, ctx: &ControlContext<'_>) -> ControlNode {
        let (key, title_key, add_key) = match repeater {
            Repeater::Meta => ("meta-query", "metaQuery", "addMetaQuery"),
            Repeater::Tax => ("tax-query", "taxonomyQuery", "addTaxonomyQuery"),
        };
        let title = ctx.t(title_key);
        let rows = rows(query, repeater);
        let mut section = primitives::section(key, title);

        if !rows.is_empty() {
            let relation = str_field(query, repeater.relation_key());
            section = section.with_child(
                primitives::select_input(
                    repeater.relation_key(),
                    ctx.t("relation"),
                    if relation.is_empty() { "AND" } else { relation },
                    None,
                    &SelectOption::from_pairs([("AND", "AND"), ("OR", "OR")]),
                )
                .with_attr("data-action", "set"),
            );
        }

        for (index, row) in rows.iter().enumerate() {
            let row = row.as_object().cloned().unwrap_or_default();
            let row_field = |field: &str, node: ControlNode| {
                node.with_attr("data-action", "updateRow")
                    .with_attr("data-index", index.to_string())
                    .with_key(format!("{}-{}-{}", key, index, field))
            };

            let mut item = ControlNode::element("div")
                .with_key(format!("{}-{}", key, index))
                .with_child(
                    ControlNode::element("div")
                        .with_key("header")
                        .with_child(ControlNode::text(format!("{} {}", title, index + 1)))
                        .with_child(
                            primitives::button("remove", "removeRow", ctx.t("remove"))
                                .with_attr("data-index", index.to_string())
                                .with_attr("data-repeater", repeater.key()),
                        ),
                );

            match repeater {
                Repeater::Meta => {
                    item = item
                        .with_child(row_field("key", primitives::text_input("key", ctx.t("metaKey"), str_field(&row, "key"), None)))
                        .with_child(row_field(
                            "value",
                            primitives::text_input("value", ctx.t("metaValue"), &value_text(row.get("value").unwrap_or(&Value::Null)), None),
                        ))
                        .with_child(row_field(
                            "compare",
                            primitives::select_input("compare", ctx.t("compare"), str_field(&row, "compare"), None, &options(&META_COMPARE, ctx)),
                        ))
                        .with_child(row_field(
                            "type",
                            primitives::select_input("type", ctx.t("type"), str_field(&row, "type"), None, &options(&META_TYPES, ctx)),
                        ))
                        .with_child(row_field(
                            "clause_name",
                            primitives::text_input("clause_name", ctx.t("clauseName"), str_field(&row, "clause_name"), None)
                                .with_attr("help", ctx.t("clauseNameDesc")),
                        ));
                }
                Repeater::Tax => {
                    let taxonomies: Vec<SelectOption> = ctx
                        .host
                        .taxonomy_options()
                        .into_iter()
                        .map(|(value, label)| SelectOption::new(value, label))
                        .collect();
                    let include_children = if row.get("include_children") == Some(&Value::Bool(false)) {
                        "false"
                    } else {
                        "true"
                    };
                    item = item
                        .with_child(row_field(
                            "taxonomy",
                            primitives::select_input(
                                "taxonomy",
                                ctx.t("taxonomy"),
                                str_field(&row, "taxonomy"),
                                Some(ctx.t("selectTaxonomy")),
                                &taxonomies,
                            ),
                        ))
                        .with_child(row_field(
                            "field",
                            primitives::select_input("field", ctx.t("field"), str_field(&row, "field"), None, &options(&TAX_FIELDS, ctx)),
                        ))
                        .with_child(row_field(
                            "terms",
                            primitives::text_input("terms", ctx.t("terms"), &value_text(row.get("terms").unwrap_or(&Value::Null)), None),
                        ))
                        .with_child(row_field(
                            "operator",
                            primitives::select_input("operator", ctx.t("compare"), str_field(&row, "operator"), None, &options(&TAX_OPERATORS, ctx)),
                        ))
                        .with_child(row_field(
                            "include_children",
                            primitives::select_input(
                                "include_children",
                                ctx.t("includeChildren"),
                                include_children,
                                None,
                                &[SelectOption::new("true", ctx.t("true")), SelectOption::new("false", ctx.t("false"))],
                            ),
                        ));
                }
            }
            section = section.with_child(item);
        }

        section.with_child(
            primitives::button(&format!("add-{}", key), "addRow", ctx.t(add_key)).with_attr("data-repeater", repeater.key()),
        )
    }
}

fn text_field(key: &str, label: &str, query: &Map<String, Value>, placeholder: Option<&str>) -> ControlNode {
    primitives::text_input(key, label, &value_text(query.get(key).unwrap_or(&Value::Null)), placeholder)
        .with_attr("data-action", "set")
}

fn number_field(key: &str, label: &str, query: &Map<String, Value>) -> ControlNode {
    primitives::number_input(key, label, &value_text(query.get(key).unwrap_or(&Value::Null)), None)
        .with_attr("data-action", "setNumber")
}

fn check_field(key: &str, label: &str, query: &Map<String, Value>) -> ControlNode {
    primitives::checkbox(key, label, truthy(query.get(key))).with_attr("data-action", "set")
}
