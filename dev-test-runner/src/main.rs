use schema_openapi::{ApiDocs, Method, RoutePath, RouteSpec, SchemaNode};
use tracing_subscriber::EnvFilter;

/// Realistic route set:
/// - primitives with bigint/date annotations
/// - optional and nullable fields
/// - tuples, unions and enums hoisted into components
/// - a recursive category tree
/// - nested mounts and a regex route
fn register_sample_routes(docs: &mut ApiDocs) -> schema_openapi::Result<()> {
    let category = SchemaNode::recursive(|this| {
        SchemaNode::object([
            ("name", SchemaNode::string()),
            ("children", SchemaNode::array(this)),
        ])
    });

    docs.route(
        RouteSpec::new(Method::Get, "/health").description("liveness probe"),
        "health",
    )?;

    docs.nest("/api", |docs| -> schema_openapi::Result<()> {
        docs.nest("/v1", |docs| -> schema_openapi::Result<()> {
            docs.route(
                RouteSpec::new(Method::Get, "/users/:id")
                    .params(SchemaNode::object([("id", SchemaNode::bigint())]))
                    .query(SchemaNode::object([
                        ("expand", SchemaNode::optional(SchemaNode::boolean())),
                        ("since", SchemaNode::date()),
                        ("window", SchemaNode::object([
                            ("from", SchemaNode::date()),
                            ("limit", SchemaNode::bigint()),
                        ])),
                    ])),
                "get_user",
            )?;
            docs.route(
                RouteSpec::new(Method::Post, "/users")
                    .body(SchemaNode::object([
                        ("name", SchemaNode::string()),
                        ("nickname", SchemaNode::nullable(SchemaNode::string())),
                        ("role", SchemaNode::enumeration(["admin", "member"])),
                        ("location", SchemaNode::tuple([SchemaNode::number(), SchemaNode::number()])),
                        ("tags", SchemaNode::array(SchemaNode::string())),
                        ("meta", SchemaNode::record(SchemaNode::any())),
                    ])),
                "create_user",
            )?;
            docs.route(
                RouteSpec::new(Method::Put, "/categories/:slug")
                    .params(SchemaNode::object([("slug", SchemaNode::string())]))
                    .body(category.clone()),
                "put_category",
            )?;
            docs.route(
                RouteSpec::new(Method::Post, "/search").body(SchemaNode::union([
                    SchemaNode::object([("text", SchemaNode::string())]),
                    SchemaNode::object([("category", category.clone())]),
                ])),
                "search",
            )?;
            Ok(())
        }).1
    }).1?;

    let files = RoutePath::pattern(r"^/files/(\d+)$", "/files/:id")?;
    docs.route(
        RouteSpec::new(Method::Get, files).params(SchemaNode::object([("id", SchemaNode::number())])),
        "get_file",
    )?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut docs = ApiDocs::default();
    if let Err(error) = register_sample_routes(&mut docs) {
        eprintln!("❌ failed: {error}");
        std::process::exit(1);
    }
    match docs.document() {
        Ok(doc) => match serde_json::to_string_pretty(&doc) {
            Ok(src) => println!("{src}"),
            Err(error) => eprintln!("❌ failed: {error}"),
        },
        Err(error) => eprintln!("❌ failed: {error}"),
    }
}
