use anyhow::Result;
use attendance::cli::{Cli, Command};
use attendance::models::{AttendanceFilter, NewStudent, parse_date};
use attendance::web::{self, AppState};
use attendance::{Settings, create_manager, display, logging, report};
use clap::Parser;
use std::collections::HashSet;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let settings = Settings::load_from(&cli.config)?;
    let mut manager = create_manager(&settings)?;

    match cli.command {
        Command::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| settings.bind_addr.clone());
            let state = AppState::new(manager, settings.export_dir.clone());
            web::serve(state, &bind_addr).await?;
        }
        Command::Roster { full } => display::show_roster(&mut manager, full)?,
        Command::AddStudent {
            roll_no,
            name,
            section,
        } => {
            let student = manager.add_student(&NewStudent::new(&roll_no, &name, &section)?)?;
            println!("Added {} ({}) with ID {}", student.name, student.roll_no, student.id);
        }
        Command::RemoveStudent { id } => {
            let student = manager.delete_student(id)?;
            println!("Removed {} ({})", student.name, student.roll_no);
        }
        Command::Mark { date, present } => {
            let date = parse_date(&date)?;
            let present: HashSet<i32> = present.into_iter().collect();
            let summary = manager.mark_attendance(date, &present)?;
            println!(
                "{date}: {} present, {} absent",
                summary.present, summary.absent
            );
        }
        Command::Show { date, section } => {
            let filter = AttendanceFilter::parse(date.as_deref(), section.as_deref())?;
            display::show_attendance(&mut manager, &filter)?;
        }
        Command::Export => {
            let records = manager.get_attendance(&AttendanceFilter::default())?;
            let exported = report::export_report(&records, &settings.export_dir)?;
            println!(
                "Wrote {} records to {}",
                exported.rows,
                exported.path.display()
            );
        }
    }

    Ok(())
}
