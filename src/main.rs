use std::io::{self, BufRead, Write};

use log::info;

use demand_forecast_bot::handlers::chat;
use demand_forecast_bot::models::ConversationState;
use demand_forecast_bot::services::loader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the demand forecasting chatbot...");

    // Load the demand series once per session; it is read-only afterwards and
    // shared by reference with every forecast request.
    let records = loader::fetch_sales_records(loader::SALES_DATA_URL).await?;
    let series = loader::load_monthly_series(&records)?;
    info!(
        "Monthly demand series ready: {} observations through {}",
        series.len(),
        series.last_date()
    );

    println!("Demand Forecasting Chatbot");
    println!("Ask me about motorcycle demand forecasts! (Ctrl-D to quit)");

    let mut state = ConversationState::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let reply = chat::handle_query(&mut state, &series, query);
        println!("{}\n", reply);
    }

    info!(
        "Session finished after {} messages",
        state.messages.len()
    );
    Ok(())
}
