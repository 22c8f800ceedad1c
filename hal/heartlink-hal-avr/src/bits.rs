//! Bit positions per register
//!
//! One enum per register, so a bit can only be applied to the register it
//! belongs to. Discriminants are the datasheet bit numbers.

use heartlink_hal::BitPosition;

macro_rules! register_bits {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $bit:ident = $index:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $bit = $index),+
        }

        impl BitPosition for $name {
            fn index(self) -> u8 {
                self as u8
            }
        }
    };
}

register_bits! {
    /// Timer/Counter1 control register B
    Tccr1b {
        /// Clock select bit 0
        Cs10 = 0,
        /// Clock select bit 1
        Cs11 = 1,
        /// Clock select bit 2
        Cs12 = 2,
        /// Waveform generation mode bit 2 (CTC on OCR1A when alone)
        Wgm12 = 3,
        Wgm13 = 4,
        Ices1 = 6,
        Icnc1 = 7,
    }
}

register_bits! {
    /// Timer/Counter1 interrupt mask
    Timsk1 {
        Toie1 = 0,
        /// Output compare A match interrupt enable
        Ocie1a = 1,
        Ocie1b = 2,
        Ocie1c = 3,
        Icie1 = 5,
    }
}

register_bits! {
    /// USART0 control and status register A
    Ucsr0a {
        Mpcm0 = 0,
        /// Double transmission speed
        U2x0 = 1,
        Upe0 = 2,
        Dor0 = 3,
        Fe0 = 4,
        /// Data register empty (ready to transmit)
        Udre0 = 5,
        Txc0 = 6,
        /// Receive complete
        Rxc0 = 7,
    }
}

register_bits! {
    /// USART0 control and status register B
    Ucsr0b {
        Txb80 = 0,
        Rxb80 = 1,
        Ucsz02 = 2,
        /// Transmitter enable
        Txen0 = 3,
        /// Receiver enable
        Rxen0 = 4,
        Udrie0 = 5,
        Txcie0 = 6,
        Rxcie0 = 7,
    }
}

register_bits! {
    /// USART0 control and status register C
    Ucsr0c {
        Ucpol0 = 0,
        Ucsz00 = 1,
        Ucsz01 = 2,
        /// Two stop bits when set
        Usbs0 = 3,
        Upm00 = 4,
        Upm01 = 5,
        Umsel00 = 6,
        Umsel01 = 7,
    }
}

register_bits! {
    /// SPI control register
    Spcr {
        Spr0 = 0,
        Spr1 = 1,
        Cpha = 2,
        Cpol = 3,
        /// Controller (master) select
        Mstr = 4,
        Dord = 5,
        /// SPI enable
        Spe = 6,
        Spie = 7,
    }
}

register_bits! {
    /// SPI status register
    Spsr {
        Spi2x = 0,
        Wcol = 6,
        /// Transfer complete
        Spif = 7,
    }
}

register_bits! {
    /// Bits of a plain data register (UDR0, SPDR)
    DataBit {
        D0 = 0,
        D1 = 1,
        D2 = 2,
        D3 = 3,
        D4 = 4,
        D5 = 5,
        D6 = 6,
        D7 = 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasheet_positions() {
        assert_eq!(Ucsr0a::Udre0.mask(), 0x20);
        assert_eq!(Ucsr0a::Rxc0.mask(), 0x80);
        assert_eq!(Spsr::Spif.mask(), 0x80);
        assert_eq!(Timsk1::Ocie1a.mask(), 0x02);
        assert_eq!(Tccr1b::Cs12.mask() | Tccr1b::Wgm12.mask(), 0x0C);
        assert_eq!(
            Spcr::Spe.mask() | Spcr::Mstr.mask() | Spcr::Spr0.mask(),
            0x51
        );
    }
}
