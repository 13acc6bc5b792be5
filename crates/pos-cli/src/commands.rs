use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use pos_ledger::{DoneOrderDetail, DoneOrderSummary, PosService, RefundOrders};
use pos_server::{PosServer, ServerConfig};
use pos_store::{InMemoryPosStore, StoreSnapshot};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Search(args) => cmd_search(&config, args, format),
        Command::Show(args) => cmd_show(&config, args, format),
        Command::Refund(args) => cmd_refund(&config, args, format),
        Command::Refunds(args) => cmd_refunds(&config, args, format),
        Command::Serve(args) => cmd_serve(config, args),
    }
}

/// Config file first, then command-line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    Ok(config)
}

fn open_service(path: &Path) -> anyhow::Result<PosService<InMemoryPosStore>> {
    let snapshot = StoreSnapshot::load(path)
        .with_context(|| format!("reading data file {}", path.display()))?;
    let service = PosService::new(InMemoryPosStore::from_snapshot(snapshot)?);
    let violations = service.audit()?;
    if !violations.is_empty() {
        eprintln!(
            "{} {} holds {} line(s) breaking the return rules:",
            "warning:".yellow().bold(),
            path.display(),
            violations.len()
        );
        for violation in &violations {
            eprintln!("  line #{}: {}", violation.line, violation);
        }
    }
    Ok(service)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_search(config: &ServerConfig, args: SearchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = open_service(&config.data_path)?;
    let found = service.search_done_orders_for_pos(&args.query, args.session)?;
    match format {
        OutputFormat::Json => print_json(&found),
        OutputFormat::Text => {
            if found.is_empty() {
                println!("No done orders found.");
            }
            for order in &found {
                print_summary(order);
            }
            Ok(())
        }
    }
}

fn cmd_show(config: &ServerConfig, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = open_service(&config.data_path)?;
    let detail = service.load_done_order_for_pos(args.order)?;
    match format {
        OutputFormat::Json => print_json(&detail),
        OutputFormat::Text => {
            print_detail(&detail);
            Ok(())
        }
    }
}

fn cmd_refund(config: &ServerConfig, args: RefundArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = open_service(&config.data_path)?;
    let duplication = service.create_refund_order(args.order)?;
    if !args.dry_run {
        service.store().snapshot()?.save(&config.data_path)?;
    }
    let detail = service.load_done_order_for_pos(duplication.order)?;
    match format {
        OutputFormat::Json => print_json(&detail),
        OutputFormat::Text => {
            let saved = if args.dry_run { " (dry run, not saved)" } else { "" };
            println!(
                "{} Created refund order {} (#{}){}",
                "✓".green().bold(),
                duplication.name.bold(),
                duplication.order,
                saved.dimmed()
            );
            print_detail(&detail);
            Ok(())
        }
    }
}

fn cmd_refunds(config: &ServerConfig, args: RefundsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let service = open_service(&config.data_path)?;
    let refunds = service.list_refund_orders(args.order)?;
    if format == OutputFormat::Json {
        return print_json(&refunds);
    }
    match refunds {
        RefundOrders::Single { order } => print_detail(&order),
        RefundOrders::Many { orders } if orders.is_empty() => {
            println!("Order #{} has no refund orders.", args.order);
        }
        RefundOrders::Many { orders } => {
            println!("Order #{} has {} refund orders:", args.order, orders.len());
            for id in orders {
                println!("  #{}", id.to_string().yellow());
            }
        }
    }
    Ok(())
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address {bind}"))?;
    }
    if args.no_persist {
        config.persist = false;
    }
    let server = PosServer::open(config)?;
    println!(
        "POS server on {} (data: {})",
        server.config().bind_addr.to_string().bold(),
        server.config().data_path.display()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn print_summary(order: &DoneOrderSummary) {
    let partner = order
        .partner
        .as_ref()
        .map(|p| p.display_name.as_str())
        .unwrap_or("-");
    let returnable = if order.is_returnable {
        "returnable".green()
    } else {
        "not returnable".dimmed()
    };
    println!(
        "{:>6}  {:<20} {:<24} {:<20} {} {:>10.2}  {}",
        format!("#{}", order.id).yellow(),
        order.name.bold(),
        order.pos_reference.as_deref().unwrap_or("-"),
        partner,
        order.date_order.format("%Y-%m-%d %H:%M"),
        order.amount_total,
        returnable
    );
}

fn print_detail(detail: &DoneOrderDetail) {
    println!(
        "Order {} {} ({})",
        format!("#{}", detail.id).yellow().bold(),
        detail.name.bold(),
        detail.pos_reference.as_deref().unwrap_or("no reference")
    );
    println!("  Date: {}", detail.date_order.format("%Y-%m-%d %H:%M:%S"));
    if let Some(partner) = detail.partner_id {
        println!("  Customer: #{partner}");
    }
    if let Some(returned) = detail.returned_order_id {
        println!(
            "  Refund of: #{} {}",
            returned,
            detail.returned_order_reference.as_deref().unwrap_or("").cyan()
        );
    }
    if detail.to_invoice {
        println!("  {}", "Invoiced".blue());
    }
    for line in &detail.lines {
        let qty = if line.qty < 0 {
            line.qty.to_string().red()
        } else {
            line.qty.to_string().normal()
        };
        println!(
            "    line #{:<5} product #{:<5} qty {:>5}  returnable {:>5}  @ {:.2} (-{}%)",
            line.id, line.product_id, qty, line.qty_returnable, line.price_unit, line.discount
        );
    }
    for payment in &detail.payments {
        println!("    paid {:.2} on journal #{}", payment.amount, payment.journal_id);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pos_store::{PosState, PosWriter};
    use pos_types::{
        ConfigId, LineDraft, OrderDraft, PosConfig, PosSession, Product, ProductId, SessionId,
    };

    use super::*;

    fn write_data_file(path: &Path) {
        let mut state = PosState::new();
        state.add_config(PosConfig::new(ConfigId::new(1), "Main"));
        state.add_session(PosSession {
            id: SessionId::new(1),
            config: ConfigId::new(1),
        });
        state.add_product(Product::new(ProductId::new(1), "Apple"));
        let order = state
            .insert_order(OrderDraft::paid("Main/0001", ConfigId::new(1), 30.0))
            .unwrap();
        state
            .insert_line(LineDraft::sale(order, ProductId::new(1), 3, 10.0))
            .unwrap();
        state.to_snapshot().save(path).unwrap();
    }

    fn run(args: &[&str]) -> anyhow::Result<()> {
        run_command(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn refund_is_saved_to_the_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.json");
        write_data_file(&path);
        let data = path.to_str().unwrap();

        run(&["posret", "refund", "1", "--data", data]).unwrap();

        let saved = StoreSnapshot::load(&path).unwrap();
        assert_eq!(saved.orders.len(), 2);
        assert_eq!(saved.orders[1].returned_order, Some(pos_types::OrderId::new(1)));
        let refund_line = saved.lines.iter().find(|l| l.qty < 0).unwrap();
        assert_eq!(refund_line.qty, -3);
    }

    #[test]
    fn dry_run_leaves_the_data_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.json");
        write_data_file(&path);
        let before = std::fs::read_to_string(&path).unwrap();

        run(&["posret", "refund", "1", "--dry-run", "--data", path.to_str().unwrap()]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn read_commands_succeed_on_a_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.json");
        write_data_file(&path);
        let data = path.to_str().unwrap();

        run(&["posret", "search", "-s", "1", "--data", data]).unwrap();
        run(&["posret", "show", "1", "--data", data, "--format", "json"]).unwrap();
        run(&["posret", "refunds", "1", "--data", data]).unwrap();
    }

    #[test]
    fn unknown_order_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.json");
        write_data_file(&path);

        let err = run(&["posret", "show", "99", "--data", path.to_str().unwrap()]).unwrap_err();
        assert!(err.to_string().contains("order not found"));
    }

    #[test]
    fn over_refunded_data_file_still_loads() {
        use pos_store::PosReader;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pos.json");
        write_data_file(&path);
        let mut state = pos_store::PosState::from_snapshot(StoreSnapshot::load(&path).unwrap()).unwrap();
        let original = state.require_line(pos_types::LineId::new(1)).unwrap();
        state
            .insert_line(original.refund_draft(pos_types::OrderId::new(1), -7))
            .unwrap();
        state.to_snapshot().save(&path).unwrap();

        let service = open_service(&path).unwrap();
        assert_eq!(service.audit().unwrap().len(), 1);
        run(&["posret", "show", "1", "--data", path.to_str().unwrap()]).unwrap();
    }

    #[test]
    fn missing_data_file_is_reported_with_its_path() {
        let err = run(&["posret", "show", "1", "--data", "/nonexistent/pos.json"]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pos.json"));
    }

    #[test]
    fn config_file_supplies_the_data_path() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("pos.json");
        write_data_file(&data);
        let config = dir.path().join("posret.toml");
        std::fs::write(&config, format!("data_path = {:?}\n", data.to_str().unwrap())).unwrap();

        run(&["posret", "refund", "1", "--config", config.to_str().unwrap()]).unwrap();
        assert_eq!(StoreSnapshot::load(&data).unwrap().orders.len(), 2);
    }
}
