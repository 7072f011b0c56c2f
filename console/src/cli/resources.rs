use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Args, Subcommand};
use evadmin_client::resources::{
    ConnectorType, InvoiceStatus, InvoiceUpdate, PlanDraft, ReservationDraft, ReservationStatus,
    ReservationUpdate, SessionInvoicing, StationDraft, StationStatus, VehicleDraft,
};

use super::Console;
use super::list::ListArgs;
use crate::render::{print_item, print_items};

#[derive(Subcommand)]
pub enum StationsCmd {
    /// List stations.
    List(ListArgs),
    /// Create a station.
    Create(StationArgs),
    /// Replace a station.
    Update {
        id: String,
        #[clap(flatten)]
        args: StationArgs,
    },
    /// Delete a station.
    Delete { id: String },
}

#[derive(Args)]
pub struct StationArgs {
    #[clap(long)]
    name: String,
    #[clap(long)]
    location_id: String,
    #[clap(long, default_value = "Online")]
    status: StationStatus,
}

impl StationArgs {
    fn into_draft(self) -> StationDraft {
        StationDraft {
            name: self.name,
            location_id: self.location_id,
            status: self.status,
        }
    }
}

impl StationsCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().stations();
        match self {
            Self::List(args) => {
                let request = args.to_request_with_status::<StationStatus>(console.page_size())?;
                let page = api.list(&request).await?;
                print_items(&page.items, Some(&page.info), console.json())
            }
            Self::Create(args) => {
                let station = api.create(&args.into_draft()).await?;
                print_item(&station, console.json())
            }
            Self::Update { id, args } => {
                let station = api.update(&id, &args.into_draft()).await?;
                print_item(&station, console.json())
            }
            Self::Delete { id } => {
                api.delete(&id).await?;
                console.done(format_args!("station {id} deleted"));
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum PlansCmd {
    /// List plans.
    List(ListArgs),
    /// Show one plan.
    Get { id: String },
    /// Create a plan.
    Create(PlanArgs),
    /// Replace a plan.
    Update {
        id: String,
        #[clap(flatten)]
        args: PlanArgs,
    },
    /// Delete a plan.
    Delete { id: String },
}

#[derive(Args)]
pub struct PlanArgs {
    #[clap(long)]
    name: String,
    #[clap(long, default_value = "")]
    description: String,
    /// Plan type, e.g. Prepaid, Postpaid or VIP.
    #[clap(long = "type")]
    kind: String,
    #[clap(long)]
    price: f64,
    #[clap(long)]
    max_daily_kwh: Option<f64>,
}

impl PlanArgs {
    fn into_draft(self) -> PlanDraft {
        PlanDraft {
            name: self.name,
            description: self.description,
            kind: self.kind,
            price: self.price,
            max_daily_kwh: self.max_daily_kwh,
        }
    }
}

impl PlansCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().plans();
        match self {
            Self::List(args) => {
                let page = api.list(&args.to_request(console.page_size())).await?;
                print_items(&page.items, Some(&page.info), console.json())
            }
            Self::Get { id } => print_item(&api.get(&id).await?, console.json()),
            Self::Create(args) => print_item(&api.create(&args.into_draft()).await?, console.json()),
            Self::Update { id, args } => {
                print_item(&api.update(&id, &args.into_draft()).await?, console.json())
            }
            Self::Delete { id } => {
                api.delete(&id).await?;
                console.done(format_args!("plan {id} deleted"));
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum VehiclesCmd {
    /// List vehicles. Filter with `-f model=..`, `-f brand=..` and
    /// `--status <connector type>`.
    List(ListArgs),
    /// Show one vehicle.
    Get { id: String },
    /// Register a vehicle.
    Create(VehicleArgs),
    /// Replace a vehicle.
    Update {
        id: String,
        #[clap(flatten)]
        args: VehicleArgs,
    },
    /// Delete a vehicle.
    Delete { id: String },
}

#[derive(Args)]
pub struct VehicleArgs {
    #[clap(long)]
    make: String,
    #[clap(long)]
    model: String,
    #[clap(long)]
    year: u16,
    #[clap(long)]
    license_plate: String,
    #[clap(long)]
    connector_type: ConnectorType,
}

impl VehicleArgs {
    fn into_draft(self) -> VehicleDraft {
        VehicleDraft {
            make: self.make,
            model: self.model,
            year: self.year,
            license_plate: self.license_plate,
            connector_type: self.connector_type,
        }
    }
}

impl VehiclesCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().vehicles();
        match self {
            Self::List(args) => {
                let page_size = console.config().list.vehicles_page_size;
                let request = args.to_request_with_status::<ConnectorType>(page_size)?;
                let page = api.list(&request).await?;
                print_items(&page.items, Some(&page.info), console.json())
            }
            Self::Get { id } => print_item(&api.get(&id).await?, console.json()),
            Self::Create(args) => {
                let draft = args.into_draft();
                api.create(&draft).await?;
                console.done(format_args!("vehicle {} created", draft.license_plate));
                Ok(())
            }
            Self::Update { id, args } => {
                api.update(&id, &args.into_draft()).await?;
                console.done(format_args!("vehicle {id} updated"));
                Ok(())
            }
            Self::Delete { id } => {
                api.delete(&id).await?;
                console.done(format_args!("vehicle {id} deleted"));
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum ReservationsCmd {
    /// List reservations. Filter with `-f userId=..` and `--status`.
    List(ListArgs),
    /// Show one reservation.
    Get { id: String },
    /// Book a connector.
    Create(ReservationArgs),
    /// Reschedule or change the status of a reservation.
    Update {
        id: String,
        #[clap(flatten)]
        args: ReservationArgs,
        #[clap(long)]
        status: ReservationStatus,
    },
    /// Cancel a reservation.
    Cancel { id: String },
}

#[derive(Args)]
pub struct ReservationArgs {
    #[clap(long)]
    station_id: String,
    #[clap(long)]
    connector_id: String,
    /// RFC 3339 timestamp, e.g. 2025-03-01T08:00:00+07:00.
    #[clap(long, value_parser = parse_timestamp)]
    start_time: DateTime<FixedOffset>,
    #[clap(long, value_parser = parse_timestamp)]
    end_time: DateTime<FixedOffset>,
}

impl ReservationArgs {
    fn into_draft(self) -> Result<ReservationDraft> {
        anyhow::ensure!(
            self.start_time < self.end_time,
            "reservation must end after it starts"
        );
        Ok(ReservationDraft {
            station_id: self.station_id,
            connector_id: self.connector_id,
            start_time: self.start_time.to_rfc3339(),
            end_time: self.end_time.to_rfc3339(),
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
}

impl ReservationsCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().reservations();
        match self {
            Self::List(args) => {
                let request =
                    args.to_request_with_status::<ReservationStatus>(console.page_size())?;
                let page = api.list(&request).await?;
                print_items(&page.items, Some(&page.info), console.json())
            }
            Self::Get { id } => print_item(&api.get(&id).await?, console.json()),
            Self::Create(args) => {
                let created = api.create(&args.into_draft()?).await?;
                print_item(&created, console.json())
            }
            Self::Update { id, args, status } => {
                let update = ReservationUpdate {
                    slot: args.into_draft()?,
                    status,
                };
                print_item(&api.update(&id, &update).await?, console.json())
            }
            Self::Cancel { id } => {
                api.cancel(&id).await?;
                console.done(format_args!("reservation {id} cancelled"));
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum InvoicesCmd {
    /// List invoices.
    List(ListArgs),
    /// Bill a finished charging session.
    FromSession {
        #[clap(long)]
        session_id: String,
        /// Tax rate as a fraction, e.g. 0.1.
        #[clap(long, default_value_t = 0.1)]
        tax_rate: f64,
        #[clap(long, default_value_t = 14)]
        due_days: u32,
    },
    /// Replace the billing details of an invoice.
    Update {
        id: String,
        #[clap(long, value_parser = parse_timestamp)]
        period_start: DateTime<FixedOffset>,
        #[clap(long, value_parser = parse_timestamp)]
        period_end: DateTime<FixedOffset>,
        #[clap(long)]
        status: InvoiceStatus,
        #[clap(long)]
        subtotal_amount: f64,
        #[clap(long)]
        tax_amount: f64,
        #[clap(long, default_value_t = 0.0)]
        amount_paid: f64,
        #[clap(long, value_parser = parse_timestamp)]
        due_date: DateTime<FixedOffset>,
    },
    /// Delete an invoice.
    Delete { id: String },
    /// Record a payment.
    Pay {
        id: String,
        #[clap(long)]
        amount: f64,
    },
    /// Cancel an invoice.
    Cancel { id: String },
}

impl InvoicesCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().invoices();
        match self {
            Self::List(args) => {
                let request = args.to_request_with_status::<InvoiceStatus>(console.page_size())?;
                if let Some(status) = request.status.as_deref() {
                    let status: InvoiceStatus = status.parse().map_err(anyhow::Error::msg)?;
                    anyhow::ensure!(
                        status.is_filterable(),
                        "invoices cannot be filtered by {status}"
                    );
                }
                let page = api.list(&request).await?;
                print_items(&page.items, Some(&page.info), console.json())
            }
            Self::FromSession {
                session_id,
                tax_rate,
                due_days,
            } => {
                let invoicing = SessionInvoicing {
                    session_id,
                    tax_rate,
                    due_days,
                };
                print_item(&api.create_from_session(&invoicing).await?, console.json())
            }
            Self::Update {
                id,
                period_start,
                period_end,
                status,
                subtotal_amount,
                tax_amount,
                amount_paid,
                due_date,
            } => {
                let update = InvoiceUpdate {
                    period_start: period_start.to_rfc3339(),
                    period_end: period_end.to_rfc3339(),
                    status,
                    subtotal_amount,
                    tax_amount,
                    amount_paid,
                    due_date: due_date.to_rfc3339(),
                };
                print_item(&api.update(&id, &update).await?, console.json())
            }
            Self::Delete { id } => {
                api.delete(&id).await?;
                console.done(format_args!("invoice {id} deleted"));
                Ok(())
            }
            Self::Pay { id, amount } => {
                anyhow::ensure!(amount > 0.0, "payment amount must be positive");
                let invoice = api
                    .pay(&id, amount)
                    .await
                    .with_context(|| format!("failed to pay invoice {id}"))?;
                print_item(&invoice, console.json())
            }
            Self::Cancel { id } => print_item(&api.cancel(&id).await?, console.json()),
        }
    }
}

#[derive(Subcommand)]
pub enum SessionsCmd {
    /// List charging sessions.
    List {
        /// Only sessions that have not been invoiced yet.
        #[clap(long)]
        uninvoiced: bool,
        #[clap(flatten)]
        args: ListArgs,
    },
}

impl SessionsCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().sessions();
        match self {
            Self::List { uninvoiced, args } => {
                let request = args.to_request(console.page_size());
                let page = if uninvoiced {
                    api.list_uninvoiced(&request).await?
                } else {
                    api.list(&request).await?
                };
                print_items(&page.items, Some(&page.info), console.json())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum LocationsCmd {
    /// List locations. Filter with `-f city=..`.
    List(ListArgs),
}

impl LocationsCmd {
    pub async fn run(self, console: &Console) -> Result<()> {
        let api = console.gateway().locations();
        match self {
            Self::List(args) => {
                let page = api.list(&args.to_request(console.page_size())).await?;
                print_items(&page.items, Some(&page.info), console.json())
            }
        }
    }
}
