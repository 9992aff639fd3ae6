//! Arithmetic and logic.
//!
//! These operate on the register file alone. Decimal mode follows the
//! NMOS and CMOS sequences documented by Bruce Clark ("Decimal Mode",
//! 6502.org tutorial, appendix A and B), which also pin down the results
//! for non-BCD inputs.

use crate::Registers;

/// How ADC/SBC (and ARR) treat the D flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Binary,
    /// NMOS decimal: N, V and Z leak from intermediate/binary results.
    NmosDecimal,
    /// 65C02 decimal: N and Z describe the decimal result.
    CmosDecimal,
}

impl Registers {
    pub fn adc(&mut self, val: u8, arithmetic: Arithmetic) {
        let a = self.a;
        let carry = u16::from(self.flags.carry());
        let binary = u16::from(a) + u16::from(val) + carry;

        if arithmetic == Arithmetic::Binary {
            let result = binary as u8;
            self.flags.set_carry(binary > 0xFF);
            self.flags
                .set_overflow(!(a ^ val) & (a ^ result) & 0x80 != 0);
            self.flags.set_nz(result);
            self.a = result;
            return;
        }

        // Low nibble, carrying a corrected digit into bit 4
        let mut lo = u16::from(a & 0x0F) + u16::from(val & 0x0F) + carry;
        if lo >= 0x0A {
            lo = ((lo + 0x06) & 0x0F) + 0x10;
        }
        let mut result = u16::from(a & 0xF0) + u16::from(val & 0xF0) + lo;

        // N and V are taken before the high digit is corrected
        let intermediate = result as u8;
        self.flags
            .set_overflow(!(a ^ val) & (a ^ intermediate) & 0x80 != 0);

        if result >= 0xA0 {
            result += 0x60;
        }
        self.flags.set_carry(result > 0xFF);
        self.a = result as u8;

        if arithmetic == Arithmetic::CmosDecimal {
            self.flags.set_nz(self.a);
        } else {
            self.flags.negative_result = intermediate;
            self.flags.zero_result = binary as u8;
        }
    }

    pub fn sbc(&mut self, val: u8, arithmetic: Arithmetic) {
        let a = self.a;
        let carry = i16::from(self.flags.carry());
        let binary = i16::from(a) - i16::from(val) + carry - 1;
        let binary_result = binary as u8;

        // C and V always come from the binary subtraction
        self.flags.set_carry(binary >= 0);
        self.flags
            .set_overflow((a ^ val) & (a ^ binary_result) & 0x80 != 0);

        let lo = i16::from(a & 0x0F) - i16::from(val & 0x0F) + carry - 1;
        match arithmetic {
            Arithmetic::Binary => {
                self.flags.set_nz(binary_result);
                self.a = binary_result;
            }
            Arithmetic::NmosDecimal => {
                let lo = if lo < 0 { ((lo - 0x06) & 0x0F) - 0x10 } else { lo };
                let mut result = i16::from(a & 0xF0) - i16::from(val & 0xF0) + lo;
                if result < 0 {
                    result -= 0x60;
                }
                self.flags.set_nz(binary_result);
                self.a = result as u8;
            }
            Arithmetic::CmosDecimal => {
                let mut result = binary;
                if result < 0 {
                    result -= 0x60;
                }
                if lo < 0 {
                    result -= 0x06;
                }
                self.a = result as u8;
                self.flags.set_nz(self.a);
            }
        }
    }

    /// CMP/CPX/CPY.
    pub fn compare(&mut self, reg: u8, val: u8) {
        self.flags.set_carry(reg >= val);
        self.flags.set_nz(reg.wrapping_sub(val));
    }

    pub fn bit(&mut self, val: u8) {
        self.flags.zero_result = self.a & val;
        self.flags.negative_result = val;
        self.flags.overflow = val;
    }

    pub fn asl(&mut self, val: u8) -> u8 {
        let result = val << 1;
        self.flags.set_carry(val & 0x80 != 0);
        self.flags.set_nz(result);
        result
    }

    pub fn lsr(&mut self, val: u8) -> u8 {
        let result = val >> 1;
        self.flags.set_carry(val & 0x01 != 0);
        self.flags.set_nz(result);
        result
    }

    pub fn rol(&mut self, val: u8) -> u8 {
        let result = (val << 1) | u8::from(self.flags.carry());
        self.flags.set_carry(val & 0x80 != 0);
        self.flags.set_nz(result);
        result
    }

    pub fn ror(&mut self, val: u8) -> u8 {
        let result = (val >> 1) | (u8::from(self.flags.carry()) << 7);
        self.flags.set_carry(val & 0x01 != 0);
        self.flags.set_nz(result);
        result
    }

    /// ARR: AND, then ROR, with flags (and in NMOS decimal mode, the
    /// result) mangled by the adder.
    pub fn arr(&mut self, val: u8, arithmetic: Arithmetic) {
        let and = self.a & val;
        let mut result = (and >> 1) | (u8::from(self.flags.carry()) << 7);
        self.flags.set_nz(result);

        if arithmetic == Arithmetic::NmosDecimal {
            self.flags.set_overflow((and ^ result) & 0x40 != 0);
            if (and & 0x0F) + (and & 0x01) > 0x05 {
                result = (result & 0xF0) | (result.wrapping_add(0x06) & 0x0F);
            }
            let high_fix = u16::from(and & 0xF0) + u16::from(and & 0x10) > 0x50;
            if high_fix {
                result = result.wrapping_add(0x60);
            }
            self.flags.set_carry(high_fix);
        } else {
            self.flags.set_carry(result & 0x40 != 0);
            self.flags
                .set_overflow(((result >> 6) ^ (result >> 5)) & 0x01 != 0);
        }
        self.a = result;
    }

    /// SBX: X = (A AND X) - imm, carry as for CMP.
    pub fn sbx(&mut self, val: u8) {
        let and = self.a & self.x;
        self.flags.set_carry(and >= val);
        self.x = and.wrapping_sub(val);
        self.flags.set_nz(self.x);
    }
}
