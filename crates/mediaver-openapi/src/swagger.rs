//! Swagger UI HTML generation

const SWAGGER_UI_VERSION: &str = "5.11.0";

/// Generate Swagger UI HTML page
///
/// Assets are loaded from the public CDN; the page only embeds the URL of
/// the OpenAPI document.
pub fn generate_swagger_html(openapi_url: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Swagger UI</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css">
    <style>
        body {{
            margin: 0;
            padding: 0;
        }}
        .swagger-ui .topbar {{
            display: none;
        }}
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {{
            SwaggerUIBundle({{
                url: "{url}",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            }});
        }};
    </script>
</body>
</html>"#,
        title = title,
        version = SWAGGER_UI_VERSION,
        url = openapi_url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_points_at_the_document_url() {
        let html = generate_swagger_html("/openapi.json", "Inventory");
        assert!(html.contains(r#"url: "/openapi.json""#));
        assert!(html.contains("<title>Inventory - Swagger UI</title>"));
    }
}
