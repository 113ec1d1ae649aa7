//! Demo server: one `widgets` table served under `/widget/`.
//!
//! Run: `DATABASE_URL=postgres://localhost/widgets cargo run --example server`
//! Optional `CONFIG_PATH` points at a JSON config file.

use async_trait::async_trait;
use resource_sdk::{
    config, init_tracing, serve, AppError, Creatable, Deletable, Endpoint, Mapper, Outcome, Readable, Registry,
    Request, Selector, Writable,
};
use serde::{Deserialize, Serialize};

const TABLE: &str = "widgets";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Widget {
    id: i64,
    name: String,
    status: Option<String>,
}

resource_sdk::impl_record!(Widget { id, name, status => "state" });

fn path_id(request: &Request) -> Option<i64> {
    request.path_arg("id").and_then(|id| id.parse().ok())
}

#[async_trait]
impl Readable for Widget {
    async fn read(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError> {
        let Some(id) = path_id(request) else {
            return Ok(Outcome::bad_request("invalid widget id"));
        };
        if !mapper.find_one(self, TABLE, &[Selector::eq("id", id)]).await? {
            return Ok(Outcome::not_found("widget not found"));
        }
        Ok(Outcome::success())
    }
}

#[async_trait]
impl Writable for Widget {
    async fn write(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError> {
        let Some(id) = path_id(request) else {
            return Ok(Outcome::bad_request("invalid widget id"));
        };
        self.id = id;
        let key = [Selector::eq("id", id)];
        if mapper.exists(TABLE, &key).await? {
            let affected = mapper.update(TABLE, self, &key).await?;
            return Ok(Outcome::success().with_counts(affected, affected, 0));
        }
        mapper.create(TABLE, self).await?;
        Ok(Outcome::created(format!("/widget/{}/", id)))
    }
}

#[async_trait]
impl Creatable for Widget {
    async fn create(&mut self, _request: &Request, mapper: &Mapper) -> Result<Outcome, AppError> {
        if mapper.exists(TABLE, &[Selector::eq("id", self.id)]).await? {
            return Ok(Outcome::conflict("widget with this id already exists"));
        }
        mapper.create(TABLE, self).await?;
        Ok(Outcome::created(format!("/widget/{}/", self.id)))
    }
}

#[async_trait]
impl Deletable for Widget {
    async fn delete(&mut self, request: &Request, mapper: &Mapper) -> Result<Outcome, AppError> {
        let Some(id) = path_id(request) else {
            return Ok(Outcome::bad_request("invalid widget id"));
        };
        mapper.delete(TABLE, &[Selector::eq("id", id)]).await?;
        Ok(Outcome::no_content())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = match std::env::var("CONFIG_PATH") {
        Ok(path) => config::load(path).await?,
        Err(_) => {
            let mut cfg = config::Config::default();
            config::apply_env(&mut cfg);
            config::validate(&cfg)?;
            cfg
        }
    };
    init_tracing(cfg.debug);

    let mut registry = Registry::new();
    registry.register("/widget/", r"^$", Endpoint::<Widget>::default_allocated().creatable())?;
    registry.register(
        "/widget/",
        r"^(?P<id>[0-9]+)/$",
        Endpoint::<Widget>::default_allocated()
            .readable()
            .writable()
            .deletable(),
    )?;

    serve(cfg, registry).await?;
    Ok(())
}
