use std::convert::Infallible;
use std::net::SocketAddr;

use log::error;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::tlx::dashboard::render_dashboard;
use crate::tlx::query::{build_report, error_envelope, report_envelope, ResultsReport};
use crate::tlx::store::ResultStore;
use crate::tlx::*;

/// Reads the whole store and aggregates it. Each call uses its own connection.
pub async fn load_report(database_url: String) -> TlxResult<ResultsReport> {
    tokio::task::spawn_blocking(move || -> TlxResult<ResultsReport> {
        let store = ResultStore::open(&database_url)?;
        let documents = store.load_all()?;
        Ok(build_report(&documents))
    })
    .await
    .context(BlockingTaskSnafu {})?
}

async fn handle_results(database_url: String) -> Result<impl Reply, Infallible> {
    match load_report(database_url).await {
        Ok(report) => {
            debug!("handle_results: {:?}", report.debug);
            Ok(warp::reply::with_status(
                warp::reply::json(&report_envelope(&report)),
                StatusCode::OK,
            ))
        }
        Err(e) => {
            error!("handle_results: {}: {:?}", e, e);
            Ok(warp::reply::with_status(
                warp::reply::json(&error_envelope()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_dashboard(database_url: String) -> Result<impl Reply, Infallible> {
    let report = match load_report(database_url).await {
        Ok(report) => Some(report),
        Err(e) => {
            error!("handle_dashboard: {}: {:?}", e, e);
            None
        }
    };
    Ok(warp::reply::html(render_dashboard(report.as_ref())))
}

pub fn routes(
    database_url: String,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let with_db = warp::any().map(move || database_url.clone());

    let api = warp::path!("api" / "results")
        .and(warp::get())
        .and(with_db.clone())
        .and_then(handle_results);

    let page = warp::path::end()
        .and(warp::get())
        .and(with_db)
        .and_then(handle_dashboard);

    api.or(page)
}

/// Serves the API and the dashboard until the process is stopped.
pub fn run_server(database_url: &str, bind: &str) -> TlxResult<()> {
    let addr: SocketAddr = bind.parse().context(InvalidAddressSnafu { address: bind })?;
    // Fails early when the store cannot be opened.
    ResultStore::open(database_url)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(RuntimeSnafu {})?;
    info!("Serving the dashboard on http://{}", addr);
    runtime.block_on(warp::serve(routes(database_url.to_string())).run(addr));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JSValue};

    fn db_with_results(name: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "tlxdash-server-{}-{}.sqlite",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let url = path.display().to_string();
        let store = ResultStore::open(&url).unwrap();
        for (version, minutes, score) in [("optimized", 3.0, 30.0), ("feature", 4.0, 50.0)] {
            store
                .insert_document(&json!({
                    "version": version,
                    "startTime": "2024-03-05T14:00:00Z",
                    "endTime": "2024-03-05T15:00:00Z",
                    "duration": minutes * 60000.0,
                    "confirmationCode": version,
                    "nasatlx": {"mentalDemand": score, "physicalDemand": score, "temporalDemand": score,
                                "performance": score, "effort": score, "frustration": score},
                }))
                .unwrap();
        }
        url
    }

    #[tokio::test]
    async fn api_results() {
        let url = db_with_results("api");
        let res = warp::test::request()
            .method("GET")
            .path("/api/results")
            .reply(&routes(url.clone()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let js: JSValue = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(js["success"], true);
        let comparison = js["data"]["comparison"].as_array().unwrap();
        assert_eq!(comparison.len(), 7);
        for row in comparison.iter().skip(1) {
            assert_eq!(row["difference"], -20.0);
        }
        assert_eq!(comparison[0]["difference"], -1.0);
        let _ = std::fs::remove_file(url);
    }

    #[tokio::test]
    async fn api_failure_is_a_500() {
        let url = "/nonexistent-tlxdash-dir/results.sqlite".to_string();
        let res = warp::test::request()
            .method("GET")
            .path("/api/results")
            .reply(&routes(url))
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let js: JSValue = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(js, error_envelope());
    }

    #[tokio::test]
    async fn dashboard_page() {
        let url = db_with_results("page");
        let res = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&routes(url.clone()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(body.contains("<td>Duration (min)</td><td>3.00</td><td>4.00</td><td>-1.00</td>"));
        let _ = std::fs::remove_file(url);
    }

    #[tokio::test]
    async fn dashboard_placeholder_on_failure() {
        let url = "/nonexistent-tlxdash-dir/results.sqlite".to_string();
        let res = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&routes(url))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(body.contains("No data available"));
    }

    #[tokio::test]
    async fn unknown_path() {
        let res = warp::test::request()
            .method("GET")
            .path("/api/other")
            .reply(&routes(":memory:".to_string()))
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_bind_address() {
        assert!(run_server(":memory:", "not an address").is_err());
    }
}
