use std::fmt::Write as _;

use obsnav_navigator::NavigatorSnapshot;

/// Plain-text rendering of what the navigator currently shows.
pub fn render(snapshot: &NavigatorSnapshot) -> String {
    let mut out = String::new();
    let query = &snapshot.query;

    let mut flags = Vec::new();
    if snapshot.stale {
        flags.push("stale, reload to refresh");
    }
    if snapshot.loading {
        flags.push("loading");
    }
    if snapshot.query_error {
        flags.push("query error");
    }
    let search = if query.search.is_empty() {
        "(none)"
    } else {
        query.search.as_str()
    };
    let _ = writeln!(
        out,
        "search: {search}  sort: {} {}",
        query.sort.label(),
        query.direction
    );
    if !flags.is_empty() {
        let _ = writeln!(out, "[{}]", flags.join("] ["));
    }

    let Some(label) = snapshot.position.label() else {
        out.push_str("No observations.");
        return out;
    };
    let record = &snapshot.record;
    let id = record
        .id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let _ = writeln!(out, "{label}  {id}");
    let _ = writeln!(out, "created:  {}", record.created_display());
    let modified_by = record
        .modified_by
        .as_deref()
        .map(|who| format!(" by {who}"))
        .unwrap_or_default();
    let _ = writeln!(out, "modified: {}{modified_by}", record.modified_display());
    let _ = writeln!(out, "tags:     {}", record.tags.join(", "));
    let images = record.images().count();
    if images > 0 {
        let _ = writeln!(out, "images:   {images}");
    }
    if let Some(attributes) = record.attributes_pre.as_deref() {
        out.push_str("attributes:\n");
        for line in attributes.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}
