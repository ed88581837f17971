use std::env;
use std::io;
use std::process::ExitCode;

use ticket_service::TicketService;
use ticket_service::csv::{read_orders, write_outcomes};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        error!("usage: ticket-service <orders.csv>");
        return ExitCode::FAILURE;
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let orders = match read_orders(&path) {
        Ok(orders) => orders,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let service = TicketService::default();
    let (order_sender, order_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in orders {
            match result {
                Ok(order) => {
                    if order_sender.send(order).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    let outcomes = service.run(ReceiverStream::new(order_receiver)).await;

    if let Err(e) = write_outcomes(io::stdout().lock(), &outcomes) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
