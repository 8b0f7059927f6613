use crate::error::Result;
use crate::manager::AttendanceManager;
use crate::models::AttendanceFilter;
use tabled::{Table, Tabled, settings::Style};

/// Pretty prints the roster.
pub fn show_roster(manager: &mut AttendanceManager, full: bool) -> Result<()> {
    let roster = manager.get_roster()?;

    let mut table = if full {
        Table::new(roster)
    } else {
        #[derive(Tabled)]
        struct SimpleStudent {
            id: i32,
            roll_no: String,
            name: String,
            section: String,
        }

        let simplified_roster: Vec<SimpleStudent> = roster
            .into_iter()
            .map(|student| SimpleStudent {
                id: student.id,
                roll_no: student.roll_no,
                name: student.name,
                section: student.section,
            })
            .collect();

        Table::new(simplified_roster)
    };

    table.with(Style::modern());
    println!("Roster:\n{table}");

    Ok(())
}

/// Pretty prints the attendance records matching `filter`, followed by the dates and sections
/// that can be filtered on.
pub fn show_attendance(manager: &mut AttendanceManager, filter: &AttendanceFilter) -> Result<()> {
    let records = manager.get_attendance(filter)?;

    if records.is_empty() {
        println!("No attendance records found.");
    } else {
        let mut table = Table::new(&records);
        table.with(Style::modern());
        println!("Attendance:\n{table}");
    }

    let dates: Vec<String> = manager
        .attendance_dates()?
        .iter()
        .map(|date| date.to_string())
        .collect();
    println!("Dates: {}", dates.join(", "));
    println!("Sections: {}", manager.sections()?.join(", "));

    Ok(())
}
