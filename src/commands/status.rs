//! Register dump

use rp1spi_core::{RegisterFile, RegisterSnapshot, Status};

/// Print every side-effect-free register of SSI `instance`
pub fn print_status<R: RegisterFile>(regs: &mut R, instance: u8) {
    let snapshot = RegisterSnapshot::capture(regs);
    println!("SPI{} registers", instance);
    println!("==============");
    println!("{}", snapshot);
    println!();
    println!("{}", describe(snapshot.status()));
}

/// One-line summary of the status register
fn describe(status: Status) -> String {
    let fifo = |set: bool, yes: &'static str, no: &'static str| if set { yes } else { no };
    format!(
        "{}, TX FIFO {}, RX FIFO {}",
        fifo(status.contains(Status::BUSY), "busy", "idle"),
        fifo(status.contains(Status::TF_EMPTY), "empty", "not empty"),
        fifo(status.contains(Status::RF_NOT_EMPTY), "has data", "empty"),
    )
}
