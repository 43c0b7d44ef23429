use threadline_llm::{GenerateOptions, GenerateRequest, GenerateResponse};

#[test]
fn test_generate_request_creation() {
    let request = GenerateRequest::new("Hello");

    assert_eq!(request.prompt, "Hello");
    assert_eq!(request.options, GenerateOptions::default());
}

#[test]
fn test_generate_request_with_options() {
    let options = GenerateOptions::new()
        .temperature(0.7)
        .max_output_tokens(100);

    let request = GenerateRequest::new("Hello").with_options(options);

    assert_eq!(request.options.temperature, Some(0.7));
    assert_eq!(request.options.max_output_tokens, Some(100));
    assert!(!request.options.is_empty());
}

#[test]
fn test_generate_options_default() {
    let options = GenerateOptions::default();

    assert_eq!(options.temperature, None);
    assert_eq!(options.max_output_tokens, None);
    assert!(options.is_empty());
}

#[test]
fn test_trimmed_text() {
    let mut response = GenerateResponse {
        text: Some("  \"Paris Trip\"  \n".to_string()),
        finish_reason: None,
        usage: None,
        raw: serde_json::Value::Null,
    };
    assert_eq!(response.trimmed_text(), Some("\"Paris Trip\""));

    response.text = Some("   ".to_string());
    assert_eq!(response.trimmed_text(), None);

    response.text = None;
    assert_eq!(response.trimmed_text(), None);
}
