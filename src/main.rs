/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use anyhow::{bail, Error};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use posr::api::context::{RequestContext, Scope};
use posr::api::endpoints::{fetch_orders, Api};
use posr::api::error::ApiResult;
use posr::api::http::Client;
use posr::api::models::{Credentials, NewCustomer, ReportParams};
use posr::api::poller::{self, DEFAULT_POLL_INTERVAL};
use posr::config::config_file::Config;
use posr::config::session::{Session, SessionStore};
use posr::order::model::{validate_orders, Order};
use posr::order::status::{OrderStatus, Transition};
use posr::parsing::filesystem::Filesystem;
use posr::reports::dashboard_reporter::{DashboardReporter, Snapshot};
use posr::reports::order_reporter::OrderReporter;
use posr::reports::sales_reporter::{PaymentReporter, SalesReporter};
use posr::reports::table::Table;
use posr::reports::time_reporter::{TimeBucket, TimeReporter};
use posr::sales::aggregate::GroupKey;
use posr::sales::filter::{OrderFilter, OrderSelector};
use posr::util::date::{parse_date, today, DateWindow, Period};
use posr::util::format::{
	currency, optional_currency, quantity, short_id, DEFAULT_CURRENCY_SYMBOL,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
	name = "posr",
	version = "0.1",
	about = "Sales reports and order tools for a restaurant POS"
)]
struct Cli {
	// ----------------
	// -- POSITIONAL --
	// ----------------
	/// The command to execute
	command: Directive,

	/// Order id, dish id, email or search text, depending on the command
	#[arg(required = false)]
	term: Option<String>,

	// -----------
	// -- FLAGS --
	// -----------
	/// Read orders from this JSON export instead of the backend
	#[arg(short)]
	file: Option<String>,

	/// Named period: all, today, last7, this-month, last-month
	#[arg(short = 'P', long)]
	period: Option<String>,

	/// First day to include (YYYY-MM-DD)
	#[arg(short, long)]
	begin: Option<String>,

	/// Last day to include (YYYY-MM-DD)
	#[arg(short, long)]
	end: Option<String>,

	/// Resolve periods as if today were this date (YYYY-MM-DD)
	#[arg(long)]
	as_of: Option<String>,

	/// Only orders whose customer name contains this text
	#[arg(short, long)]
	client: Option<String>,

	/// Only orders taken by an employee whose name contains this text
	#[arg(short, long)]
	user: Option<String>,

	/// Only orders whose payment method or delivery channel matches
	#[arg(short, long)]
	method: Option<String>,

	/// Only orders in this status
	#[arg(short, long)]
	status: Option<String>,

	/// Custom config file location (default: ~/.config/posr/config.toml)
	#[arg(long)]
	config: Option<String>,

	/// Overrides the currency symbol from config
	#[arg(long)]
	currency_symbol: Option<String>,

	/// Show at most this many rows
	#[arg(short = 'n', long)]
	limit: Option<usize>,

	/// Status change to apply: advance, back or cancel
	#[arg(short, long)]
	action: Option<String>,

	/// Password for the login command
	#[arg(long)]
	password: Option<String>,

	/// Phone number; makes the customer command register a customer
	#[arg(long)]
	phone: Option<String>,
}

impl Cli {
	/// Extra validations on top of what clap does
	fn validate(&self) -> Result<(), Error> {
		if self.period.is_some() && (self.begin.is_some() || self.end.is_some())
		{
			bail!("Use either a period or begin/end dates, not both");
		}

		if self.limit == Some(0) {
			bail!("Limit must be at least 1");
		}

		if self.file.is_some() && !self.command.reads_orders() {
			bail!("-f only applies to reports; this command needs the backend");
		}

		Ok(())
	}
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Directive {
	Dash,    // headline metrics with deltas
	Cat,     // sales by category
	Pay,     // sales by payment method
	Prod,    // sales by product
	Hour,    // order revenue by hour of day
	Day,     // order revenue by date
	Weekday, // order revenue by day of week
	Orders,  // order board

	Top, // the backend's own sales-by-product report

	Status, // move an order through the workflow
	Watch,  // keep the order board refreshed

	Login,
	Logout,
	Whoami,

	Customer, // search or register customers
	Pick,     // hand a dish over to the next command

	Tables,
	Dishes,
	Employees,
	Invoice,
	Usage,
}

impl Directive {
	/// Commands that report on a set of orders, which may come from a file.
	fn reads_orders(&self) -> bool {
		matches!(
			self,
			Directive::Dash
				| Directive::Cat
				| Directive::Pay
				| Directive::Prod
				| Directive::Hour
				| Directive::Day
				| Directive::Weekday
				| Directive::Orders
		)
	}
}

/// Orders loaded for a report together with the filters from the command
/// line, ready to be sliced by window.
struct Dataset {
	orders: Vec<Order>,
	selector: OrderSelector,
	filters: Vec<OrderFilter>,
}

impl Dataset {
	fn select(&self, window: DateWindow) -> Vec<&Order> {
		let mut filters = vec![OrderFilter::Window(window)];
		filters.extend(self.filters.iter().cloned());
		self.selector.select(&self.orders, &filters)
	}
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	init_logging();

	let args = Cli::parse();
	args.validate()?;

	let fs = Filesystem::new()?;
	// Only commands that talk to the backend need the token expanded
	let config = fs.get_config(args.config.as_ref(), args.file.is_none())?;

	let symbol = args
		.currency_symbol
		.clone()
		.or_else(|| {
			config
				.reports
				.as_ref()
				.and_then(|r| r.currency_symbol.clone())
		})
		.unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string());

	let today = match &args.as_of {
		Some(date) => parse_date(date)?,
		None => today(),
	};
	let window = resolve_window(&args, today)?;
	tracing::debug!("reporting window: {}", window);

	match args.command {
		Directive::Dash => {
			let data = load_dataset(&args, &fs, &config).await?;
			let previous = window
				.preceding()
				.map(|before| Snapshot::of(&data.select(before)));
			let reporter = DashboardReporter::new(
				window,
				Snapshot::of(&data.select(window)),
				previous,
				&symbol,
			);
			reporter.print();
		},
		Directive::Cat | Directive::Prod => {
			let key = if args.command == Directive::Cat {
				GroupKey::Category
			} else {
				GroupKey::Product
			};
			let data = load_dataset(&args, &fs, &config).await?;
			SalesReporter::new(&data.select(window), key, args.limit, &symbol)
				.print();
		},
		Directive::Pay => {
			let data = load_dataset(&args, &fs, &config).await?;
			PaymentReporter::new(&data.select(window), args.limit, &symbol)
				.print();
		},
		Directive::Hour | Directive::Day | Directive::Weekday => {
			let bucket = match args.command {
				Directive::Hour => TimeBucket::Hour,
				Directive::Day => TimeBucket::Date,
				_ => TimeBucket::Weekday,
			};
			let data = load_dataset(&args, &fs, &config).await?;
			TimeReporter::new(&data.select(window), bucket, &symbol).print();
		},
		Directive::Orders => {
			let data = load_dataset(&args, &fs, &config).await?;
			OrderReporter::new(&data.select(window), args.limit, &symbol)
				.print();
		},
		Directive::Top => {
			let (api, _) = connect(&config, &fs.session_store())?;
			let rows = api
				.sales_by_product(&ReportParams::for_window(&window))
				.await?;
			let mut table = Table::new(3);
			table.add_header(vec!["Product", "Qty", "Revenue"]);
			table.add_separator();
			table.right_align(vec![1, 2]);
			for row in rows.iter().take(args.limit.unwrap_or(usize::MAX)) {
				table.add_row(vec![
					row.name.clone(),
					quantity(row.quantity),
					currency(row.total, &symbol),
				]);
			}
			print_table(&table);
		},
		Directive::Status => {
			let Some(id) = &args.term else {
				bail!("No order id specified");
			};
			let Some(action) = &args.action else {
				bail!("No action specified; use --action advance|back|cancel");
			};
			let transition = Transition::from_str(action)?;
			let (api, _) = connect(&config, &fs.session_store())?;
			let order = api.transition_order(id, transition).await?;
			println!("Order {} is now {}", short_id(&order.id), order.status);
		},
		Directive::Watch => {
			let (api, _) = connect(&config, &fs.session_store())?;
			let interval = config
				.reports
				.as_ref()
				.and_then(|r| r.poll_interval_secs)
				.map(Duration::from_secs)
				.unwrap_or(DEFAULT_POLL_INTERVAL);
			watch(&args, api, window, interval, symbol).await?;
		},
		Directive::Login => {
			let Some(email) = &args.term else {
				bail!("No email specified");
			};
			let Some(password) = &args.password else {
				bail!("--password is required to log in");
			};
			let store = fs.session_store();
			let (api, mut session) = connect(&config, &store)?;
			let auth = api
				.login(&Credentials {
					email: email.clone(),
					password: password.clone(),
				})
				.await?;

			if auth.token.is_none() {
				tracing::warn!("login succeeded but no token was returned");
			}
			session.token = auth.token;
			session.scope = auth.user.scope();
			store.save(&session)?;
			println!("Logged in as {} <{}>", auth.user.name, auth.user.email);
		},
		Directive::Logout => {
			let store = fs.session_store();
			let mut session = store.load_or_init()?;
			match connect(&config, &store) {
				Ok((api, _)) => {
					if let Err(e) = api.logout().await {
						tracing::warn!("backend logout failed: {}", e);
					}
				},
				Err(e) => tracing::debug!("skipping backend logout: {}", e),
			}
			session.clear_auth();
			store.save(&session)?;
			println!("Logged out");
		},
		Directive::Whoami => {
			let (api, session) = connect(&config, &fs.session_store())?;
			let user = api.current_user().await?;
			let scope = &api.client().context().scope;
			println!("{} <{}>", user.name, user.email);
			println!("Role:   {}", user.role.as_deref().unwrap_or("-"));
			println!("Tenant: {}", scope.tenant_id.as_deref().unwrap_or("-"));
			println!("Client: {}", scope.client_id.as_deref().unwrap_or("-"));
			if let Some(device) = session.device_id {
				println!("Device: {}", device);
			}
		},
		Directive::Customer => {
			let Some(term) = &args.term else {
				bail!("No customer name or search text specified");
			};
			let (api, _) = connect(&config, &fs.session_store())?;
			match &args.phone {
				Some(phone) => {
					let customer = api
						.create_or_reuse_customer(&NewCustomer {
							name: term.clone(),
							phone: phone.clone(),
							address: None,
						})
						.await
						.map_err(|e| Error::msg(e.user_message()))?;
					println!(
						"{} ({}) {}",
						customer.name,
						customer.phone,
						short_id(&customer.id)
					);
				},
				None => {
					let limit = args.limit.unwrap_or(10).min(u32::MAX as usize);
					let found = api.search_customers(term, limit as u32).await?;
					let mut table = Table::new(3);
					table.add_header(vec!["Name", "Phone", "Address"]);
					table.add_separator();
					for c in found {
						table.add_row(vec![
							c.name,
							c.phone,
							c.address.unwrap_or_default(),
						]);
					}
					print_table(&table);
				},
			}
		},
		Directive::Pick => {
			let store = fs.session_store();
			match &args.term {
				Some(id) => {
					let (api, mut session) = connect(&config, &store)?;
					let dish = api.dish(id).await?;
					println!("Selected {}", dish.name);
					session.selected_dish = Some(dish);
					store.save(&session)?;
				},
				None => {
					let mut session = store.load_or_init()?;
					match session.take_selected_dish() {
						Some(dish) => {
							println!("{}", serde_json::to_string_pretty(&dish)?);
							store.save(&session)?;
						},
						None => println!("No dish selected"),
					}
				},
			}
		},
		Directive::Tables => {
			let (api, _) = connect(&config, &fs.session_store())?;
			let mut table = Table::new(3);
			table.add_header(vec!["Table", "Seats", "Status"]);
			table.add_separator();
			table.right_align(vec![0, 1]);
			for t in api.tables().await? {
				table.add_row(vec![
					t.table_no.to_string(),
					t.seats.to_string(),
					t.status.unwrap_or_default(),
				]);
			}
			print_table(&table);
		},
		Directive::Dishes => {
			let (api, _) = connect(&config, &fs.session_store())?;
			let mut table = Table::new(4);
			table.add_header(vec!["Dish", "Category", "Price", "Cost"]);
			table.add_separator();
			table.right_align(vec![2, 3]);
			let dishes = api.dishes().await?;
			for d in dishes.into_iter().take(args.limit.unwrap_or(usize::MAX)) {
				table.add_row(vec![
					d.name,
					d.category.unwrap_or_default(),
					currency(d.price, &symbol),
					optional_currency(d.cost, &symbol),
				]);
			}
			print_table(&table);
		},
		Directive::Employees => {
			let (api, _) = connect(&config, &fs.session_store())?;
			let mut table = Table::new(3);
			table.add_header(vec!["Employee", "Role", "Active"]);
			table.add_separator();
			for e in api.employees().await? {
				table.add_row(vec![
					e.name,
					e.role.unwrap_or_default(),
					match e.active {
						Some(false) => "no".to_string(),
						_ => "yes".to_string(),
					},
				]);
			}
			print_table(&table);
		},
		Directive::Invoice => {
			let Some(id) = &args.term else {
				bail!("No order id specified");
			};
			let (api, _) = connect(&config, &fs.session_store())?;
			println!("{}", api.invoice(id).await?.url);
		},
		Directive::Usage => {
			let (api, _) = connect(&config, &fs.session_store())?;
			let usage = api.usage().await?;
			println!("{}", serde_json::to_string_pretty(&usage)?);
		},
	}

	Ok(())
}

/// Logs go to stderr so report output stays clean. `RUST_LOG` overrides
/// the default level.
fn init_logging() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

/// A named period wins; otherwise begin/end dates, which default to today.
fn resolve_window(args: &Cli, today: NaiveDate) -> Result<DateWindow, Error> {
	if let Some(period) = &args.period {
		return Ok(DateWindow::for_period(Period::from_str(period)?, today));
	}

	let from = args.begin.as_deref().map(parse_date).transpose()?;
	let to = args.end.as_deref().map(parse_date).transpose()?;
	Ok(DateWindow::from_dates(from, to, today))
}

fn text_filters(args: &Cli) -> Result<Vec<OrderFilter>, Error> {
	let mut filters = Vec::new();
	if let Some(client) = &args.client {
		filters.push(OrderFilter::Client(client.clone()));
	}
	if let Some(user) = &args.user {
		filters.push(OrderFilter::User(user.clone()));
	}
	if let Some(method) = &args.method {
		filters.push(OrderFilter::Method(method.clone()));
	}
	if let Some(status) = &args.status {
		filters.push(OrderFilter::Status(OrderStatus::parse(status)?));
	}
	Ok(filters)
}

async fn load_dataset(
	args: &Cli,
	fs: &Filesystem,
	config: &Config,
) -> Result<Dataset, Error> {
	let orders = match &args.file {
		Some(file) => fs.load_orders(file)?,
		None => {
			let (api, _) = connect(config, &fs.session_store())?;
			let tenant = api.client().context().scope.tenant_id.clone();
			let orders = match tenant {
				Some(tenant) => api.orders_for_tenant(&tenant).await?,
				None => api.orders().await?,
			};
			validate_orders(&orders)?;
			orders
		},
	};

	Ok(Dataset {
		orders,
		selector: OrderSelector::new()?,
		filters: text_filters(args)?,
	})
}

/// Builds the API client from config and the saved session. The session's
/// token and scope take precedence over the config's.
fn connect(config: &Config, store: &SessionStore) -> Result<(Api, Session), Error> {
	let session = store.load_or_init()?;
	let api_config = config.api.as_ref();

	let Some(base_url) = api_config.and_then(|a| a.base_url.as_deref()) else {
		bail!("No api.base_url configured; set it in the config file");
	};

	let config_scope = Scope {
		tenant_id: api_config.and_then(|a| a.tenant_id.clone()),
		client_id: api_config.and_then(|a| a.client_id.clone()),
	};
	let token = session
		.token
		.clone()
		.or_else(|| api_config.and_then(|a| a.token.clone()));

	let mut context =
		RequestContext::new(token, session.scope.clone().or(config_scope));
	if let Some(device_id) = session.device_id {
		context = context.with_device(device_id);
	}

	let timeout = api_config
		.and_then(|a| a.timeout_secs)
		.map(Duration::from_secs);
	let client = Client::new(base_url, context, timeout)?;
	Ok((Api::new(client), session))
}

/// Reprints the order board on every poll until Ctrl-C.
async fn watch(
	args: &Cli,
	api: Api,
	window: DateWindow,
	interval: Duration,
	symbol: String,
) -> Result<(), Error> {
	let client = api.client().clone();
	let tenant = client.context().scope.tenant_id.clone();
	let selector = OrderSelector::new()?;
	let mut filters = vec![OrderFilter::Window(window)];
	filters.extend(text_filters(args)?);
	let limit = args.limit;

	let handle = poller::spawn(
		interval,
		CancellationToken::new(),
		move || {
			let client = client.clone();
			let tenant = tenant.clone();
			async move { fetch_orders(&client, tenant.as_deref()).await }
		},
		move |result: ApiResult<Vec<Order>>| match result {
			Ok(orders) => {
				let selected = selector.select(&orders, &filters);
				println!(
					"\n{} order(s), {} as of {}",
					selected.len(),
					window,
					Local::now().format("%H:%M:%S")
				);
				OrderReporter::new(&selected, limit, &symbol).print();
			},
			Err(e) => {
				tracing::warn!("{}", e);
				eprintln!("Refresh failed: {}", e.user_message());
			},
		},
	);

	tokio::signal::ctrl_c().await?;
	handle.stop().await;
	Ok(())
}

fn print_table(table: &Table) {
	if table.is_empty() {
		println!("No data");
	} else {
		table.print();
	}
}
