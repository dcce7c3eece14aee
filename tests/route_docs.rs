use pretty_assertions::assert_eq;
use schema_openapi::{
    ApiDocs, DocsConfig, Error, FinalizeOptions, InputCategory, Manifest, Method, RouteSpec, SchemaNode, Template,
};
use serde_json::{json, Value};

fn docs_from(first_type_index: u32) -> ApiDocs {
    ApiDocs::new(DocsConfig { first_type_index, ..DocsConfig::default() })
}

fn refers(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn param(location: &str, name: &str, required: bool, component: &str) -> Value {
    json!({
        "in": location,
        "name": name,
        "required": required,
        "description": format!("reffered to {component}"),
        "schema": {}
    })
}

#[test]
fn post_body_round_trips_through_the_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("docs").join("swagger.json");

    let mut docs = ApiDocs::default();
    docs.route(
        RouteSpec::new(Method::Post, "/x").body(SchemaNode::object([("b", SchemaNode::string())])),
        (),
    )
    .unwrap();
    let returned = docs.finalize(&FinalizeOptions::new(&out_file)).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&out_file).unwrap()).unwrap();
    assert_eq!(written, returned);
    assert_eq!(written["openapi"], "3.0.0");
    assert_eq!(written["info"], json!({ "title": "API documentation", "version": "1.0.0" }));
    assert_eq!(
        written["paths"]["/x"]["post"]["requestBody"],
        json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": {
                        "type": "object",
                        "properties": { "b": { "type": "string" } },
                        "required": ["b"]
                    }
                }
            }
        })
    );
    assert_eq!(written["components"]["schemas"], json!({}));
}

#[test]
fn path_parameters_are_rewritten() {
    let mut docs = ApiDocs::default();
    docs.route(RouteSpec::new(Method::Get, "/users/:id/posts/:postId"), ()).unwrap();
    let doc = docs.document().unwrap();
    assert!(doc["paths"].get("/users/{id}/posts/{postId}").is_some());
    assert!(doc["paths"].get("/users/:id/posts/:postId").is_none());
}

#[test]
fn nested_mount_prefixes_the_path() {
    let mut docs = ApiDocs::default();
    let (segment, binding) = docs.nest("/api", |docs| docs.route(RouteSpec::new(Method::Get, "/ping"), "ping"));
    let binding = binding.unwrap();
    assert_eq!(segment.documented(), "/api");
    assert_eq!(binding.path.documented(), "/ping");

    let doc = docs.document().unwrap();
    assert_eq!(doc["paths"]["/api/ping"]["get"], json!({}));
}

#[test]
fn undefined_fields_and_optional_fields() {
    let mut docs = docs_from(1);
    docs.route(
        RouteSpec::new(Method::Post, "/standard_types/undefined")
            .params(SchemaNode::object([
                ("p1", SchemaNode::undefined()),
                ("p2", SchemaNode::optional(SchemaNode::string())),
            ]))
            .query(SchemaNode::object([
                ("q1", SchemaNode::undefined()),
                ("q2", SchemaNode::optional(SchemaNode::string())),
            ]))
            .body(SchemaNode::object([
                ("b1", SchemaNode::undefined()),
                ("b2", SchemaNode::optional(SchemaNode::string())),
            ])),
        (),
    )
    .unwrap();
    let doc = docs.document().unwrap();
    let op = &doc["paths"]["/standard_types/undefined"]["post"];

    let undefined = json!({ "type": "undefined", "example": "undefined" });
    assert_eq!(
        op["parameters"],
        json!([
            { "in": "path", "name": "p1", "required": true, "schema": undefined },
            param("path", "p2", false, "type1"),
            { "in": "query", "name": "q1", "required": true, "schema": undefined },
            param("query", "q2", false, "type3"),
        ])
    );
    assert_eq!(
        op["requestBody"]["content"]["application/json"]["schema"],
        json!({
            "type": "object",
            "properties": { "b1": undefined, "b2": refers("type2") },
            "required": ["b1"]
        })
    );
    assert_eq!(
        doc["components"]["schemas"]["type2"],
        json!({ "anyOf": [{ "type": "string" }, undefined] })
    );
}

#[test]
fn nullable_fields_stay_required_and_nested_unions_number_outer_first() {
    let mut docs = docs_from(4);
    let fields = |prefix: &str| {
        SchemaNode::object([
            (format!("{prefix}1"), SchemaNode::null()),
            (format!("{prefix}2"), SchemaNode::nullable(SchemaNode::string())),
            (
                format!("{prefix}3"),
                SchemaNode::union([SchemaNode::number(), SchemaNode::string(), SchemaNode::null()]),
            ),
            (
                format!("{prefix}4"),
                SchemaNode::nullable(SchemaNode::union([SchemaNode::number(), SchemaNode::string()])),
            ),
        ])
    };
    docs.route(
        RouteSpec::new(Method::Post, "/standard_types/null")
            .params(fields("p"))
            .query(fields("q"))
            .body(fields("b")),
        (),
    )
    .unwrap();
    let doc = docs.document().unwrap();
    let op = &doc["paths"]["/standard_types/null"]["post"];

    let null_schema = json!({ "type": "null", "example": "null" });
    assert_eq!(
        op["parameters"],
        json!([
            { "in": "path", "name": "p1", "required": true, "schema": null_schema },
            param("path", "p2", true, "type4"),
            param("path", "p3", true, "type5"),
            param("path", "p4", true, "type6"),
            { "in": "query", "name": "q1", "required": true, "schema": null_schema },
            param("query", "q2", true, "type12"),
            param("query", "q3", true, "type13"),
            param("query", "q4", true, "type14"),
        ])
    );
    assert_eq!(
        op["requestBody"]["content"]["application/json"]["schema"],
        json!({
            "type": "object",
            "properties": {
                "b1": null_schema,
                "b2": refers("type8"),
                "b3": refers("type9"),
                "b4": refers("type10")
            },
            "required": ["b1", "b2", "b3", "b4"]
        })
    );
    let schemas = &doc["components"]["schemas"];
    assert_eq!(schemas["type6"], json!({ "anyOf": [refers("type7"), null_schema] }));
    assert_eq!(schemas["type7"], json!({ "anyOf": [{ "type": "number" }, { "type": "string" }] }));
    assert_eq!(schemas.as_object().unwrap().len(), 12);
}

#[test]
fn unions_tuples_and_lazies_are_numbered_params_body_query() {
    let mut docs = docs_from(16);
    let union_fields = |prefix: &str| {
        SchemaNode::object([
            (
                format!("{prefix}1"),
                SchemaNode::union([
                    SchemaNode::object([("test", SchemaNode::string())]),
                    SchemaNode::string(),
                    SchemaNode::array(SchemaNode::string()),
                ]),
            ),
            (format!("{prefix}2"), SchemaNode::union([SchemaNode::number(), SchemaNode::string()])),
        ])
    };
    docs.route(
        RouteSpec::new(Method::Post, "/standard_types/union")
            .params(union_fields("p"))
            .query(union_fields("q"))
            .body(union_fields("b")),
        (),
    )
    .unwrap();

    let tuple = || {
        SchemaNode::tuple([
            SchemaNode::string(),
            SchemaNode::number(),
            SchemaNode::object([("test", SchemaNode::string())]),
            SchemaNode::array(SchemaNode::string()),
        ])
    };
    docs.route(
        RouteSpec::new(Method::Post, "/standard_types/tuple")
            .params(SchemaNode::object([("p", tuple())]))
            .query(SchemaNode::object([("q", tuple())]))
            .body(SchemaNode::object([("b", tuple())])),
        (),
    )
    .unwrap();

    let lazy_fields = |prefix: &str| {
        SchemaNode::object([
            (format!("{prefix}1"), SchemaNode::lazy(SchemaNode::string)),
            (format!("{prefix}2"), SchemaNode::lazy(|| SchemaNode::array(SchemaNode::string()))),
        ])
    };
    docs.route(
        RouteSpec::new(Method::Post, "/standard_types/lazyInObject")
            .params(lazy_fields("p"))
            .query(lazy_fields("q"))
            .body(lazy_fields("b")),
        (),
    )
    .unwrap();

    let doc = docs.document().unwrap();
    let paths = &doc["paths"];
    assert_eq!(
        paths["/standard_types/union"]["post"]["parameters"],
        json!([
            param("path", "p1", true, "type16"),
            param("path", "p2", true, "type17"),
            param("query", "q1", true, "type20"),
            param("query", "q2", true, "type21"),
        ])
    );
    assert_eq!(
        paths["/standard_types/union"]["post"]["requestBody"]["content"]["application/json"]["schema"]["properties"],
        json!({ "b1": refers("type18"), "b2": refers("type19") })
    );
    assert_eq!(
        paths["/standard_types/tuple"]["post"]["parameters"],
        json!([param("path", "p", true, "type22"), param("query", "q", true, "type24")])
    );
    assert_eq!(
        doc["components"]["schemas"]["type23"],
        json!({
            "type": "array",
            "items": {
                "anyOf": [
                    { "type": "string" },
                    { "type": "number" },
                    {
                        "type": "object",
                        "properties": { "test": { "type": "string" } },
                        "required": ["test"]
                    },
                    { "type": "array", "items": { "type": "string" } }
                ]
            }
        })
    );
    assert_eq!(
        paths["/standard_types/lazyInObject"]["post"]["parameters"],
        json!([
            param("path", "p1", true, "type25"),
            param("path", "p2", true, "type26"),
            param("query", "q1", true, "type29"),
            param("query", "q2", true, "type30"),
        ])
    );
    assert_eq!(
        paths["/standard_types/lazyInObject"]["post"]["requestBody"]["content"]["application/json"]["schema"]["properties"],
        json!({ "b1": refers("type27"), "b2": refers("type28") })
    );
}

#[test]
fn any_and_unknown_share_one_component() {
    let mut docs = ApiDocs::default();
    docs.route(
        RouteSpec::new(Method::Post, "/any")
            .params(SchemaNode::object([("p", SchemaNode::any())]))
            .query(SchemaNode::object([("q", SchemaNode::unknown())]))
            .body(SchemaNode::object([
                ("a", SchemaNode::any()),
                ("u", SchemaNode::unknown()),
                ("list", SchemaNode::array(SchemaNode::any())),
            ])),
        (),
    )
    .unwrap();
    docs.route(
        RouteSpec::new(Method::Put, "/any").body(SchemaNode::object([("again", SchemaNode::unknown())])),
        (),
    )
    .unwrap();

    let doc = docs.document().unwrap();
    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["anyType"]);

    let post = &doc["paths"]["/any"]["post"];
    assert_eq!(
        post["parameters"][0],
        json!({
            "in": "path",
            "name": "p",
            "required": true,
            "description": "reffered to type anyType",
            "schema": {}
        })
    );
    let body = &post["requestBody"]["content"]["application/json"]["schema"]["properties"];
    assert_eq!(body["a"], refers("anyType"));
    assert_eq!(body["u"], refers("anyType"));
    assert_eq!(body["list"], json!({ "type": "array", "items": refers("anyType") }));
}

#[test]
fn root_unions_are_rejected_for_every_category() {
    let union = || SchemaNode::union([SchemaNode::string(), SchemaNode::number()]);
    let cases = [
        (RouteSpec::new(Method::Post, "/u").params(union()), InputCategory::Params),
        (RouteSpec::new(Method::Post, "/u").query(union()), InputCategory::Query),
        (RouteSpec::new(Method::Post, "/u").body(union()), InputCategory::Body),
    ];
    for (spec, expected) in cases {
        let mut docs = ApiDocs::default();
        let err = docs.route(spec, ()).unwrap_err();
        assert!(err.to_string().starts_with("unsupported root level union"), "{err}");
        match err {
            Error::UnsupportedRootUnion { category } => assert_eq!(category, expected),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(docs.paths().is_empty());
    }
}

#[test]
fn body_union_of_objects_becomes_any_of() {
    let mut docs = ApiDocs::default();
    docs.route(
        RouteSpec::new(Method::Post, "/search").body(SchemaNode::union([
            SchemaNode::object([("text", SchemaNode::string())]),
            SchemaNode::object([("id", SchemaNode::number())]),
        ])),
        (),
    )
    .unwrap();
    let doc = docs.document().unwrap();
    assert_eq!(
        doc["paths"]["/search"]["post"]["requestBody"]["content"]["application/json"]["schema"],
        json!({
            "anyOf": [
                { "type": "object", "properties": { "text": { "type": "string" } }, "required": ["text"] },
                { "type": "object", "properties": { "id": { "type": "number" } }, "required": ["id"] }
            ]
        })
    );
}

#[test]
fn array_of_objects() {
    let mut docs = ApiDocs::default();
    docs.route(
        RouteSpec::new(Method::Post, "/array").body(SchemaNode::object([(
            "list",
            SchemaNode::array(SchemaNode::object([("test", SchemaNode::string())])),
        )])),
        (),
    )
    .unwrap();
    let doc = docs.document().unwrap();
    assert_eq!(
        doc["paths"]["/array"]["post"]["requestBody"]["content"]["application/json"]["schema"]["properties"]["list"],
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": { "test": { "type": "string" } },
                "required": ["test"]
            }
        })
    );
}

#[test]
fn recursive_schema_terminates_with_one_component() {
    let tree = SchemaNode::recursive(|this| {
        SchemaNode::object([("value", SchemaNode::number()), ("children", SchemaNode::array(this))])
    });
    let mut docs = ApiDocs::default();
    docs.route(RouteSpec::new(Method::Put, "/tree").body(SchemaNode::object([("root", tree.clone())])), ())
        .unwrap();
    docs.route(RouteSpec::new(Method::Post, "/tree").body(SchemaNode::object([("root", tree)])), ())
        .unwrap();

    let doc = docs.document().unwrap();
    assert_eq!(
        doc["components"]["schemas"],
        json!({
            "type1": {
                "type": "object",
                "properties": {
                    "value": { "type": "number" },
                    "children": { "type": "array", "items": refers("type1") }
                },
                "required": ["value", "children"]
            }
        })
    );
}

#[test]
fn template_keeps_its_own_paths_and_components() {
    let template = Template::new(json!({
        "openapi": "3.0.0",
        "info": { "title": "Shop", "version": "2.1.0" },
        "paths": { "/legacy": { "get": {} }, "/x": { "get": { "description": "old" } } },
        "components": { "schemas": { "Money": { "type": "number" } } }
    }));
    let mut docs = ApiDocs::new(DocsConfig { template, ..DocsConfig::default() });
    docs.route(RouteSpec::new(Method::Get, "/x").description("new"), ()).unwrap();
    docs.route(
        RouteSpec::new(Method::Post, "/y").body(SchemaNode::object([("o", SchemaNode::optional(SchemaNode::number()))])),
        (),
    )
    .unwrap();

    let doc = docs.document().unwrap();
    assert_eq!(doc["info"]["title"], "Shop");
    assert_eq!(doc["paths"]["/legacy"], json!({ "get": {} }));
    assert_eq!(doc["paths"]["/x"], json!({ "get": { "description": "new" } }));
    let names = doc["components"]["schemas"].as_object().unwrap().keys().cloned().collect::<Vec<_>>();
    assert_eq!(names, vec!["Money", "type1"]);
}

#[test]
fn manifest_routes_document_like_direct_registration() {
    let manifest = Manifest::parse(
        r#"{
            "definitions": {
                "User": { "kind": "object", "fields": {
                    "name": { "kind": "string" },
                    "born": { "kind": "date" },
                    "friends": { "kind": "array", "element": { "kind": "ref", "name": "User" } }
                } }
            },
            "mounts": [ {
                "path": "/api",
                "routes": [
                    { "method": "post", "path": "/users", "body": { "kind": "ref", "name": "User" } },
                    { "method": "get", "path": "/users/:id",
                      "params": { "kind": "object", "fields": { "id": { "kind": "bigint" } } } }
                ]
            } ]
        }"#,
    )
    .unwrap();
    let lowered = manifest.lower().unwrap();
    let mut docs = ApiDocs::default();
    lowered.register(&mut docs).unwrap();

    let doc = docs.document().unwrap();
    assert_eq!(
        doc["paths"]["/api/users"]["post"]["requestBody"]["content"]["application/json"]["schema"],
        refers("type1")
    );
    assert_eq!(
        doc["paths"]["/api/users/{id}"]["get"]["parameters"],
        json!([{
            "in": "path",
            "name": "id",
            "required": true,
            "description": "Type: bigint",
            "schema": { "type": "number" }
        }])
    );
    assert_eq!(
        doc["components"]["schemas"]["type1"]["properties"]["born"],
        json!({ "type": "string", "description": "Type: date" })
    );
    assert_eq!(
        doc["components"]["schemas"]["type1"]["properties"]["friends"]["items"],
        refers("type1")
    );
}
