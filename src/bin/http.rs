#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use attendance_tool::http_api::{self, AppState, SharedStore};
    use attendance_tool::logging::init_logging;
    use attendance_tool::{MemoryTimetableStore, SemesterCalendar, load_calendar_config};
    use log::{info, warn};

    init_logging("info")?;

    let addr: SocketAddr = std::env::var("ATTENDANCE_TOOL_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let calendar = match std::env::var("ATTENDANCE_TOOL_CALENDAR") {
        Ok(path) => {
            info!("event=calendar_load module=http path={path}");
            load_calendar_config(&path)?
        }
        Err(_) => SemesterCalendar::default(),
    };

    let store: SharedStore = match std::env::var("ATTENDANCE_TOOL_DB") {
        #[cfg(feature = "sqlite")]
        Ok(path) => Arc::new(attendance_tool::SqliteTimetableStore::new(&path)?),
        #[cfg(not(feature = "sqlite"))]
        Ok(path) => Arc::new(attendance_tool::JsonTimetableStore::new(&path)),
        Err(_) => {
            warn!("event=store_select module=http backend=memory reason=ATTENDANCE_TOOL_DB_unset");
            Arc::new(MemoryTimetableStore::new())
        }
    };

    println!("attendance-tool HTTP API listening on http://{addr}");
    http_api::serve(addr, AppState::new(calendar, store)).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
