//! Register file of the simulated master SSI

use std::cell::RefCell;
use std::rc::Rc;

use rp1spi_core::regs::*;
use rp1spi_core::RegisterFile;

use crate::bus::BusState;

/// Simulated DW APB SSI register file
///
/// CTRLR0, CTRLR1 and BAUDR writes are ignored while the core is enabled,
/// as on silicon. Disabling the core flushes both FIFOs.
pub struct SimSsi {
    state: Rc<RefCell<BusState>>,
}

impl SimSsi {
    pub(crate) fn new(state: Rc<RefCell<BusState>>) -> Self {
        Self { state }
    }
}

impl RegisterFile for SimSsi {
    fn read(&mut self, reg: Register) -> u32 {
        let mut bus = self.state.borrow_mut();
        if reg == Register::Sr && bus.auto_clock {
            bus.tick();
        }
        let stalled = bus.stalled;
        let m = &mut bus.master;
        match reg {
            Register::Ctrlr0 => m.ctrlr0,
            Register::Ctrlr1 => m.ctrlr1,
            Register::Ssienr => m.ssienr,
            Register::Ser => m.ser,
            Register::Baudr => m.baudr,
            Register::Txftlr => m.txftlr,
            Register::Rxftlr => m.rxftlr,
            Register::Txflr => m.tx.len() as u32,
            Register::Rxflr => m.rx.len() as u32,
            Register::Sr => m.status(stalled).bits(),
            Register::Imr => m.imr,
            Register::Isr => m.risr.bits() & m.imr,
            Register::Risr => m.risr.bits(),
            Register::Txoicr => clear_irq(&mut m.risr, Interrupts::TXOI),
            Register::Rxoicr => clear_irq(&mut m.risr, Interrupts::RXOI),
            Register::Rxuicr => clear_irq(&mut m.risr, Interrupts::RXUI),
            Register::Msticr => clear_irq(&mut m.risr, Interrupts::MSTI),
            Register::Icr => clear_irq(&mut m.risr, Interrupts::all()),
            Register::Dmacr => m.dmacr,
            Register::Dr => match m.rx.pop_front() {
                Some(frame) => frame,
                None => {
                    m.risr |= Interrupts::RXUI;
                    0
                }
            },
            _ => 0,
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        let mut bus = self.state.borrow_mut();
        let m = &mut bus.master;
        let enabled = m.enabled();
        match reg {
            Register::Ctrlr0 | Register::Ctrlr1 | Register::Baudr if enabled => {
                log::debug!("sim: {} write {:#x} ignored while enabled", reg.name(), value);
                m.ignored_writes += 1;
            }
            Register::Ctrlr0 => m.ctrlr0 = value,
            Register::Ctrlr1 => m.ctrlr1 = value & CTRLR1_NDF_MASK,
            Register::Baudr => m.baudr = value & 0xfffe,
            Register::Ssienr => {
                m.ssienr = value & SSIENR_ENABLE;
                if !m.enabled() {
                    m.tx.clear();
                    m.rx.clear();
                }
            }
            Register::Ser => m.ser = value,
            Register::Txftlr => m.txftlr = value,
            Register::Rxftlr => m.rxftlr = value,
            Register::Imr => m.imr = value & Interrupts::all().bits(),
            Register::Dmacr => m.dmacr = value & DmaControl::all().bits(),
            Register::Dr => {
                if !enabled {
                    return;
                }
                if m.tx.len() < m.depth {
                    m.tx.push_back(value);
                } else {
                    m.risr |= Interrupts::TXOI;
                }
            }
            _ => {}
        }
    }
}

/// Clear `bits` in RISR, returning 1 if any of them were set
fn clear_irq(risr: &mut Interrupts, bits: Interrupts) -> u32 {
    let was_set = risr.intersects(bits);
    risr.remove(bits);
    u32::from(was_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp1spi_core::RegisterSnapshot;

    #[test]
    fn test_ctrlr0_locked_while_enabled() {
        let bus = crate::SimBus::new();
        let mut ssi = bus.master();
        ssi.write(Register::Ssienr, SSIENR_ENABLE);
        ssi.write(Register::Ctrlr0, 0x1234);
        assert_eq!(ctrlr0_frame_bits(ssi.read(Register::Ctrlr0)), 8);
        assert_eq!(bus.master_ignored_writes(), 1);
    }

    #[test]
    fn test_underflow_sets_rxui_and_icr_clears() {
        let bus = crate::SimBus::new();
        let mut ssi = bus.master();
        assert_eq!(ssi.read(Register::Dr), 0);
        assert_ne!(ssi.read(Register::Risr) & Interrupts::RXUI.bits(), 0);
        assert_eq!(ssi.read(Register::Icr), 1);
        assert_eq!(ssi.read(Register::Risr), 0);
    }

    #[test]
    fn test_snapshot_skips_data_register() {
        let bus = crate::SimBus::new();
        let mut ssi = bus.master();
        ssi.write(Register::Ssienr, SSIENR_ENABLE);
        ssi.write(Register::Dr, 7);
        let snapshot = RegisterSnapshot::capture(&mut ssi);
        assert_eq!(snapshot.get(Register::Dr), None);
        assert_eq!(snapshot.get(Register::Txflr), Some(1));
        assert!(snapshot.status().contains(Status::TF_NOT_FULL));
    }
}
