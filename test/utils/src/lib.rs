/// Smallest document most PDF readers will accept. The backend is mocked in
/// tests, so only the header and trailer matter.
pub fn pdf_fixture() -> Vec<u8> {
    return r#"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [] /Count 0 >>
endobj
trailer
<< /Root 1 0 R >>
%%EOF
"#
    .as_bytes()
    .to_vec();
}

pub fn config_fixture() -> &'static str {
    return r#"
backend-url = "http://billybot.internal:8000"
backend-timeout = 2500
persist-dir = "chroma_policies"
llm-model = "mistral"
top-k = 6
chunk-size = 800
chunk-overlap = 100
"#
    .trim();
}

pub fn bad_config_fixture() -> &'static str {
    return r#"
top-k = "many"
backend-url = 
"#
    .trim();
}
