use mdcrun_core::{extract, keys, Variables};

fn vars(pairs: &[(&str, &str)]) -> Variables {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_change_specific_link() {
    let prompt = r#"run mdc on https://webpub.autodesk.com/draftr/asset/3934720 and change link in "Get in touch" to "www.autodesk.com/uk/support""#;
    assert_eq!(
        extract(prompt),
        vars(&[
            (keys::ASSET_ID, "3934720"),
            (keys::LINK_TEXT, "Get in touch"),
            (keys::NEW_URL, "www.autodesk.com/uk/support"),
            (keys::OPERATION, "change_specific"),
        ])
    );
}

#[test]
fn test_replace_all_links() {
    let prompt = r#"run mdc on URL https://webpub.autodesk.com/draftr/asset/123456 to replace all "oldsite.com" links to "newsite.com""#;
    assert_eq!(
        extract(prompt),
        vars(&[
            (keys::ASSET_ID, "123456"),
            (keys::OLD_URL, "oldsite.com"),
            (keys::NEW_URL, "newsite.com"),
            (keys::OPERATION, "replace_all"),
        ])
    );
}

#[test]
fn test_replace_domain() {
    let prompt = r#"run mdc on URL https://webpub.autodesk.com/draftr/asset/789012 to replace all domain "/en/" links to "/uk/""#;
    assert_eq!(
        extract(prompt),
        vars(&[
            (keys::ASSET_ID, "789012"),
            (keys::OLD_DOMAIN, "/en/"),
            (keys::NEW_DOMAIN, "/uk/"),
            (keys::OPERATION, "replace_domain"),
        ])
    );
}

#[test]
fn test_case_insensitive_triggers() {
    let vars = extract(r#"RUN ON 3934720 AND CHANGE LINK IN "Contact Us" TO "Example.COM""#);
    assert_eq!(vars.get(keys::ASSET_ID).map(String::as_str), Some("3934720"));
    assert_eq!(vars.get(keys::LINK_TEXT).map(String::as_str), Some("Contact Us"));
    assert_eq!(vars.get(keys::NEW_URL).map(String::as_str), Some("Example.COM"));
    assert_eq!(vars.get(keys::OPERATION).map(String::as_str), Some("change_specific"));
}

#[test]
fn test_plain_request_has_no_variables() {
    assert!(extract("check the page for broken links").is_empty());
    assert!(extract("").is_empty());
}

#[test]
fn test_extraction_is_pure() {
    let prompt = r#"replace all "a.com" links to "b.com" on asset/42"#;
    assert_eq!(extract(prompt), extract(prompt));
}
