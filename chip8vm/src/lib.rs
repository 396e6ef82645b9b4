extern crate chip8core;
extern crate rand;
mod opcode;
mod quirks;

pub use opcode::Opcode;
pub use quirks::Quirks;

use chip8core::{
    Framebuffer, Key, Keypad, Snapshot, Step, Vm, VmError,
    GFX_H, GFX_W, MAX_PROGRAM_SIZE, MEM_SIZE, PROGRAM_START, STACK_SIZE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::default::Default;

const F: usize = 0xF;

const FONT_START: u16 = 0x000;
const GLYPH_SIZE: u16 = 5;

const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80  // F
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    /// Blocked on `FX0A`; holds X.
    AwaitingKey(u8),
}

/// How an instruction left the program counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    /// Continue with the next instruction.
    Next,
    /// Skip the next instruction.
    Skip,
    /// The handler assigned PC itself.
    Jump,
    /// Like `Next`, but a sprite was drawn.
    Draw,
    /// Stay on this instruction until a key resolves the wait.
    Block,
}

impl Flow {
    fn skip_if(cond: bool) -> Flow {
        if cond { Flow::Skip } else { Flow::Next }
    }
}

pub struct Cpu<R = StdRng> {
    mem: [u8; MEM_SIZE],
    v: [u8; 16],
    i: u16,
    pc: u16,
    gfx: Framebuffer,
    delay_timer: u8,
    sound_timer: u8,
    stack: [u16; STACK_SIZE],
    sp: usize,
    state: State,

    quirks: Quirks,
    rng: R,
}

impl Default for Cpu<StdRng> {
    fn default() -> Cpu<StdRng> {
        Cpu::with_rng(StdRng::from_entropy())
    }
}

impl Cpu<StdRng> {
    pub fn new() -> Cpu<StdRng> {
        Default::default()
    }

    /// Restarts the random sequence used by `CXNN` from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl<R: Rng> Vm for Cpu<R> {
    fn load_program(&mut self, program: &[u8]) {
        assert!(program.len() <= MAX_PROGRAM_SIZE,
                "program is {} bytes, at most {} fit in memory", program.len(), MAX_PROGRAM_SIZE);
        self.mem[PROGRAM_START..PROGRAM_START + program.len()].copy_from_slice(program);
    }

    fn step(&mut self, keypad: &mut dyn Keypad) -> Result<Step, VmError> {
        if let State::AwaitingKey(x) = self.state {
            let key = match keypad.typed().and_then(Key::from_char) {
                Some(key) => key,
                None => return Ok(Step::Waiting),
            };
            self.v[x as usize] = key.digit();
            self.state = State::Running;
            self.pc += 2;
            self.tick_timers();
            return Ok(Step::Executed);
        }

        let opcode = self.fetch()?;
        let flow = self.exec_opcode(opcode, &*keypad)?;

        match flow {
            Flow::Next | Flow::Draw => self.pc += 2,
            Flow::Skip => self.pc += 4,
            Flow::Jump | Flow::Block => {}
        }
        self.tick_timers();

        if flow == Flow::Draw {
            Ok(Step::Drew)
        } else {
            Ok(Step::Executed)
        }
    }

    fn framebuffer(&self) -> &Framebuffer {
        &self.gfx
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            v: self.v,
            i: self.i,
            pc: self.pc,
            stack: self.stack[..self.sp].to_vec(),
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            opcode: self.fetch().ok().map(Opcode::bits),
        }
    }
}

impl<R: Rng> Cpu<R> {
    /// A freshly initialized machine drawing `CXNN` bytes from `rng`.
    pub fn with_rng(rng: R) -> Cpu<R> {
        let mut cpu = Cpu {
            mem: [0; MEM_SIZE],
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START as u16,
            gfx: Framebuffer::new(),
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            sp: 0,
            state: State::Running,
            quirks: Quirks::default(),
            rng,
        };

        let font = FONT_START as usize;
        cpu.mem[font..font + FONT.len()].copy_from_slice(&FONT);

        cpu
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Cpu<R> {
        self.quirks = quirks;
        self
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn register(&self, x: u8) -> u8 {
        self.v[(x & 0xF) as usize]
    }

    pub fn set_register(&mut self, x: u8, value: u8) {
        self.v[(x & 0xF) as usize] = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, addr: u16) {
        self.pc = addr & 0x0FFF;
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, addr: u16) {
        self.i = addr & 0x0FFF;
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn memory(&self) -> &[u8] {
        &self.mem
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.state != State::Running
    }

    fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn fetch(&self) -> Result<Opcode, VmError> {
        let pc = self.pc as usize;
        if pc + 1 >= MEM_SIZE {
            return Err(VmError::IllegalAddress { addr: self.pc });
        }
        Ok(Opcode::from_bytes(self.mem[pc], self.mem[pc + 1]))
    }

    fn exec_opcode(&mut self, opcode: Opcode, keypad: &dyn Keypad) -> Result<Flow, VmError> {
        let x = opcode.x();
        let y = opcode.y();
        let addr = opcode.addr();
        let byte = opcode.byte();
        let nibble = opcode.nibble();
        let unknown = VmError::UnknownOp { opcode: opcode.bits() };

        let flow = match opcode.family() {
            0x0 => match opcode.bits() {
                0x00E0 => self.clear(),
                0x00EE => self.ret()?,
                _      => return Err(unknown),
            },
            0x1 => self.jump(addr),
            0x2 => self.call(addr)?,
            0x3 => self.skip_eq_byte(x, byte),
            0x4 => self.skip_neq_byte(x, byte),
            0x5 if nibble == 0 => self.skip_eq(x, y),
            0x6 => self.set_byte(x, byte),
            0x7 => self.add_byte(x, byte),
            0x8 => match nibble {
                0x0 => self.set(x, y),
                0x1 => self.or(x, y),
                0x2 => self.and(x, y),
                0x3 => self.xor(x, y),
                0x4 => self.add(x, y),
                0x5 => self.sub(x, y),
                0x6 => self.shift_right(x, y),
                0x7 => self.subn(x, y),
                0xE => self.shift_left(x, y),
                _   => return Err(unknown),
            },
            0x9 if nibble == 0 => self.skip_neq(x, y),
            0xA => self.set_i_byte(addr),
            0xB => self.jump_v0(addr),
            0xC => self.rand(x, byte),
            0xD => self.draw(x, y, nibble)?,
            0xE => match byte {
                0x9E => self.skip_pressed(x, keypad).ok_or(unknown)?,
                0xA1 => self.skip_not_pressed(x, keypad).ok_or(unknown)?,
                _    => return Err(unknown),
            },
            0xF => match byte {
                0x07 => self.get_delay_timer(x),
                0x0A => self.await_key_press(x),
                0x15 => self.set_delay_timer(x),
                0x18 => self.set_sound_timer(x),
                0x1E => self.i_add(x),
                0x29 => self.set_char(x),
                0x33 => self.store_bcd(x)?,
                0x55 => self.store_regs(x)?,
                0x65 => self.load_regs(x)?,
                _    => return Err(unknown),
            },
            _ => return Err(unknown),
        };
        Ok(flow)
    }

    fn clear(&mut self) -> Flow {
        self.gfx.clear();
        Flow::Next
    }

    fn ret(&mut self) -> Result<Flow, VmError> {
        if self.sp == 0 {
            return Err(VmError::IllegalReturn);
        }
        self.sp -= 1;
        self.pc = self.stack[self.sp];
        Ok(Flow::Next)
    }

    fn jump(&mut self, addr: u16) -> Flow {
        self.pc = addr;
        Flow::Jump
    }

    // Pushes the address of the call itself; `ret` steps past it.
    fn call(&mut self, addr: u16) -> Result<Flow, VmError> {
        if self.sp == STACK_SIZE {
            return Err(VmError::StackFull);
        }
        self.stack[self.sp] = self.pc;
        self.sp += 1;
        self.pc = addr;
        Ok(Flow::Jump)
    }

    fn skip_eq_byte(&mut self, x: u8, byte: u8) -> Flow {
        Flow::skip_if(self.v[x as usize] == byte)
    }

    fn skip_neq_byte(&mut self, x: u8, byte: u8) -> Flow {
        Flow::skip_if(self.v[x as usize] != byte)
    }

    fn skip_eq(&mut self, x: u8, y: u8) -> Flow {
        Flow::skip_if(self.v[x as usize] == self.v[y as usize])
    }

    fn set_byte(&mut self, x: u8, byte: u8) -> Flow {
        self.v[x as usize] = byte;
        Flow::Next
    }

    fn add_byte(&mut self, x: u8, byte: u8) -> Flow {
        self.v[x as usize] = self.v[x as usize].wrapping_add(byte);
        Flow::Next
    }

    fn set(&mut self, x: u8, y: u8) -> Flow {
        self.v[x as usize] = self.v[y as usize];
        Flow::Next
    }

    fn or(&mut self, x: u8, y: u8) -> Flow {
        self.v[x as usize] |= self.v[y as usize];
        self.logic_vf_reset()
    }

    fn and(&mut self, x: u8, y: u8) -> Flow {
        self.v[x as usize] &= self.v[y as usize];
        self.logic_vf_reset()
    }

    fn xor(&mut self, x: u8, y: u8) -> Flow {
        self.v[x as usize] ^= self.v[y as usize];
        self.logic_vf_reset()
    }

    fn logic_vf_reset(&mut self) -> Flow {
        if self.quirks.logic_resets_vf {
            self.v[F] = 0;
        }
        Flow::Next
    }

    // In the arithmetic group the flag is written last, so it wins when X is F.

    fn add(&mut self, x: u8, y: u8) -> Flow {
        let (sum, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
        self.v[x as usize] = sum;
        self.v[F] = carry as u8;
        Flow::Next
    }

    fn sub(&mut self, x: u8, y: u8) -> Flow {
        let vx = self.v[x as usize];
        let vy = self.v[y as usize];
        self.v[x as usize] = vx.wrapping_sub(vy);
        self.v[F] = (vx >= vy) as u8;
        Flow::Next
    }

    fn shift_source(&self, x: u8, y: u8) -> u8 {
        if self.quirks.shift_reads_vy {
            self.v[y as usize]
        } else {
            self.v[x as usize]
        }
    }

    fn shift_right(&mut self, x: u8, y: u8) -> Flow {
        let src = self.shift_source(x, y);
        self.v[x as usize] = src >> 1;
        self.v[F] = src & 0b1;
        Flow::Next
    }

    fn subn(&mut self, x: u8, y: u8) -> Flow {
        let vx = self.v[x as usize];
        let vy = self.v[y as usize];
        self.v[x as usize] = vy.wrapping_sub(vx);
        self.v[F] = (vy >= vx) as u8;
        Flow::Next
    }

    fn shift_left(&mut self, x: u8, y: u8) -> Flow {
        let src = self.shift_source(x, y);
        self.v[x as usize] = src << 1;
        self.v[F] = src >> 7;
        Flow::Next
    }

    fn skip_neq(&mut self, x: u8, y: u8) -> Flow {
        Flow::skip_if(self.v[x as usize] != self.v[y as usize])
    }

    fn set_i_byte(&mut self, addr: u16) -> Flow {
        self.i = addr;
        Flow::Next
    }

    fn jump_v0(&mut self, addr: u16) -> Flow {
        self.pc = (addr + self.v[0] as u16) & 0x0FFF;
        Flow::Jump
    }

    fn rand(&mut self, x: u8, byte: u8) -> Flow {
        self.v[x as usize] = self.rng.gen::<u8>() & byte;
        Flow::Next
    }

    fn draw(&mut self, x: u8, y: u8, nibble: u8) -> Result<Flow, VmError> {
        let i = self.i as usize;
        let n = nibble as usize;
        if i + n > MEM_SIZE {
            return Err(VmError::IllegalAddress { addr: self.i });
        }

        let vx = self.v[x as usize] as usize % GFX_W;
        let vy = self.v[y as usize] as usize % GFX_H;
        let wrap = self.quirks.wrap_sprites;
        let mut collision = false;

        for (spr_y, byte) in self.mem[i..(i + n)].iter().enumerate() {
            let mut gfx_y = vy + spr_y;
            if gfx_y >= GFX_H {
                if !wrap { break; }
                gfx_y %= GFX_H;
            }
            for spr_x in 0..8 {
                let mut gfx_x = vx + spr_x;
                if gfx_x >= GFX_W {
                    if !wrap { break; }
                    gfx_x %= GFX_W;
                }
                let mask = 0b1000_0000u8 >> spr_x;
                collision |= self.gfx.flip(gfx_x, gfx_y, (byte & mask) != 0);
            }
        }

        self.v[F] = collision as u8;
        Ok(Flow::Draw)
    }

    fn skip_pressed(&mut self, x: u8, keypad: &dyn Keypad) -> Option<Flow> {
        let key = Key::from_digit(self.v[x as usize])?;
        Some(Flow::skip_if(keypad.is_down(key)))
    }

    fn skip_not_pressed(&mut self, x: u8, keypad: &dyn Keypad) -> Option<Flow> {
        let key = Key::from_digit(self.v[x as usize])?;
        Some(Flow::skip_if(!keypad.is_down(key)))
    }

    fn get_delay_timer(&mut self, x: u8) -> Flow {
        self.v[x as usize] = self.delay_timer;
        Flow::Next
    }

    fn await_key_press(&mut self, x: u8) -> Flow {
        self.state = State::AwaitingKey(x);
        Flow::Block
    }

    fn set_delay_timer(&mut self, x: u8) -> Flow {
        self.delay_timer = self.v[x as usize];
        Flow::Next
    }

    fn set_sound_timer(&mut self, x: u8) -> Flow {
        self.sound_timer = self.v[x as usize];
        Flow::Next
    }

    fn i_add(&mut self, x: u8) -> Flow {
        self.i = (self.i + self.v[x as usize] as u16) & 0x0FFF;
        Flow::Next
    }

    fn set_char(&mut self, x: u8) -> Flow {
        self.i = FONT_START + self.v[x as usize] as u16 * GLYPH_SIZE;
        Flow::Next
    }

    fn store_bcd(&mut self, x: u8) -> Result<Flow, VmError> {
        let i = self.i as usize;
        if i > MEM_SIZE - 3 {
            return Err(VmError::IllegalAddress { addr: self.i });
        }
        let vx = self.v[x as usize];

        self.mem[i] = vx / 100;
        self.mem[i + 1] = (vx / 10) % 10;
        self.mem[i + 2] = vx % 10;
        Ok(Flow::Next)
    }

    fn reg_block(&self, x: u8) -> Result<usize, VmError> {
        let end = self.i as usize + x as usize;
        if end >= MEM_SIZE {
            return Err(VmError::IllegalAddress { addr: self.i });
        }
        Ok(self.i as usize)
    }

    fn store_regs(&mut self, x: u8) -> Result<Flow, VmError> {
        let start = self.reg_block(x)?;
        let n = x as usize + 1;
        self.mem[start..start + n].copy_from_slice(&self.v[..n]);
        self.i = (self.i + n as u16) & 0x0FFF;
        Ok(Flow::Next)
    }

    fn load_regs(&mut self, x: u8) -> Result<Flow, VmError> {
        let start = self.reg_block(x)?;
        let n = x as usize + 1;
        self.v[..n].copy_from_slice(&self.mem[start..start + n]);
        self.i = (self.i + n as u16) & 0x0FFF;
        Ok(Flow::Next)
    }
}
