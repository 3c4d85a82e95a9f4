//! Small builders for the hand-assembled OpenAPI fragments modules return.

use serde_json::{json, Value};

/// Name of the bearer security scheme registered by the router.
pub const BEARER_SCHEME: &str = "bearerAuth";

/// `$ref` to a component schema.
pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", name) })
}

/// Array of a component schema.
pub fn array_of(name: &str) -> Value {
    json!({ "type": "array", "items": schema_ref(name) })
}

/// Required integer path parameter.
pub fn path_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "integer" }
    })
}

/// Required string path parameter.
pub fn text_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema_ref("ErrorResponse") }
        }
    })
}

/// One operation object. `errors` lists the status codes it can fail with.
pub struct Operation {
    value: Value,
}

impl Operation {
    pub fn new(tag: &str, summary: &str, status: u16, schema: Value) -> Self {
        let mut value = json!({
            "summary": summary,
            "tags": [tag],
            "parameters": [],
            "responses": {}
        });
        value["responses"][status.to_string()] = json!({
            "description": summary,
            "content": { "application/json": { "schema": schema } }
        });
        Self { value }
    }

    pub fn param(mut self, param: Value) -> Self {
        if let Some(params) = self.value["parameters"].as_array_mut() {
            params.push(param);
        }
        self
    }

    pub fn body(mut self, schema: Value) -> Self {
        self.value["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": schema } }
        });
        self
    }

    pub fn errors(mut self, statuses: &[u16]) -> Self {
        for status in statuses {
            let description = match status {
                400 => "Malformed path parameter or body",
                401 => "Missing or invalid bearer token",
                404 => "Record not found",
                409 => "Conflicting record",
                422 => "Rejected value",
                _ => "Internal server error",
            };
            self.value["responses"][status.to_string()] = error_response(description);
        }
        self
    }

    pub fn bearer(mut self) -> Self {
        self.value["security"] = json!([{ BEARER_SCHEME: [] }]);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// Serialize a derived schema for the `components.schemas` map.
pub fn component<T: utoipa::ToSchema>() -> (String, Value) {
    let schema = serde_json::to_value(T::schema()).unwrap_or(Value::Null);
    (T::name().into_owned(), schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_collects_parts() {
        let op = Operation::new("Books", "Get book", 200, schema_ref("Book"))
            .param(path_param("id", "Book identity"))
            .errors(&[400, 404])
            .bearer()
            .build();

        assert_eq!(op["tags"][0], "Books");
        assert_eq!(op["parameters"][0]["name"], "id");
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Book"
        );
        assert!(op["responses"]["404"].is_object());
        assert!(op["security"][0][BEARER_SCHEME].is_array());
    }
}
