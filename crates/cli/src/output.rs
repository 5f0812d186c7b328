use serde_json::Value;

pub fn emit(value: &Value, json: bool, plain: fn(&Value) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", plain(value));
    }
    Ok(())
}

pub fn render_tags(value: &Value) -> String {
    let mut out = String::new();
    for tag in value["tags"].as_array().into_iter().flatten() {
        out.push_str(&format!(
            "{}\t{}\n",
            tag["tag"].as_str().unwrap_or_default(),
            tag["files"]
        ));
    }
    out.push_str(&format!(
        "{} tag(s) over {} file(s)\n",
        value["tags"].as_array().map(Vec::len).unwrap_or(0),
        value["files"]
    ));
    out
}

pub fn render_selection(value: &Value) -> String {
    let mut out = String::new();
    for file in value["files"].as_array().into_iter().flatten() {
        out.push_str(file["path"].as_str().unwrap_or_default());
        out.push('\n');
    }
    let subtags: Vec<&str> = value["subtags"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    out.push_str(&format!("subtags: {}\n", subtags.join(", ")));
    out
}

pub fn render_apply(value: &Value) -> String {
    let report = &value["report"];
    let mut out = format!(
        "{} {}: linked {}, unlinked {}",
        report["kind"].as_str().unwrap_or_default(),
        report["tag"].as_str().unwrap_or("-"),
        report["linked"],
        report["unlinked"],
    );
    if report["tag_created"].as_bool() == Some(true) {
        out.push_str(", tag created");
    }
    if report["tag_removed"].as_bool() == Some(true) {
        out.push_str(", tag removed");
    }
    out.push('\n');
    out.push_str(&render_selection(&value["selection"]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selection_lists_paths_then_subtags() {
        let value = json!({
            "files": [{ "path": "a/x" }, { "path": "a/y" }],
            "subtags": ["a", "txt"],
        });
        assert_eq!(render_selection(&value), "a/x\na/y\nsubtags: a, txt\n");
    }

    #[test]
    fn apply_mentions_tag_lifecycle() {
        let value = json!({
            "report": {
                "kind": "remove_tag",
                "tag": "old",
                "linked": 0,
                "unlinked": 3,
                "tag_created": false,
                "tag_removed": true,
            },
            "selection": { "files": [], "subtags": [] },
        });
        assert_eq!(
            render_apply(&value),
            "remove_tag old: linked 0, unlinked 3, tag removed\nsubtags: \n"
        );
    }
}
