#![no_std]
#![no_main]

use core::sync::atomic::{AtomicI8, AtomicI32, AtomicU32, Ordering};

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::usart::BufferedUart;
use embassy_stm32::{bind_interrupts, peripherals, usart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use halldrive_control::command::MELODY_MAX;
use halldrive_control::commutation::Lead;
use heapless::String;
use static_cell::StaticCell;

mod console;
mod hasher;
mod melody;
mod motor;
mod report;

use motor::HallInputs;
use motor::duty::DutyOutput;
use motor::phases::PhaseOutputs;

use defmt_rtt as _;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    USART2 => usart::BufferedInterruptHandler<peripherals::USART2>;
});

/// Signed hall-step count.  Written only from the hall watcher; the
/// controller reads it with a plain atomic load and zeroes it when a new
/// rotation target arrives.  A stale read across a tick boundary is
/// tolerated.
pub static STEP_COUNT: AtomicI32 = AtomicI32::new(0);

/// Commutation lead in sectors: +2 forward, -2 reverse.  Written by the
/// controller, read by the hall watcher on every edge.
pub static LEAD_OFFSET: AtomicI8 = AtomicI8::new(Lead::Forward.offset());

/// Hashes tried since boot, for the `H` rate report.
pub static HASH_COUNT: AtomicU32 = AtomicU32::new(0);

/// Latest speed estimate as f32 bits, for the `S` status ping.
static VELOCITY_BITS: AtomicU32 = AtomicU32::new(0);

/// Controller wake-up.  A `Signal` holds at most one pending tick, so
/// timer fires that land while the controller is still busy coalesce
/// instead of queueing.
pub static CONTROL_TICK: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub fn store_velocity(velocity: f32) {
    VELOCITY_BITS.store(velocity.to_bits(), Ordering::Relaxed);
}

pub fn load_velocity() -> f32 {
    f32::from_bits(VELOCITY_BITS.load(Ordering::Relaxed))
}

type ParamMutex<T> = Mutex<CriticalSectionRawMutex, T>;

/// Command parameters shared between the dispatcher and the control and
/// background tasks.  One lock per parameter; locks are held only for the
/// read or the parse-and-assign, never across another blocking call.
pub struct SharedParams {
    pub key: ParamMutex<u64>,
    pub duty_override: ParamMutex<f32>,
    pub target_velocity: ParamMutex<f32>,
    pub target_rotations: ParamMutex<f32>,
    pub melody: ParamMutex<String<MELODY_MAX>>,
}

pub static PARAMS: SharedParams = SharedParams {
    key: Mutex::new(0),
    duty_override: Mutex::new(0.0),
    target_velocity: Mutex::new(0.0),
    target_rotations: Mutex::new(0.0),
    melody: Mutex::new(String::new()),
};

/// Single owner of the PWM duty/period registers, shared between the
/// control loop and the tone player.
pub type SharedDuty = Mutex<CriticalSectionRawMutex, DutyOutput<'static>>;

static DUTY: StaticCell<SharedDuty> = StaticCell::new();
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// High-priority executor: the hall interrupt path.
static EXECUTOR_HALL: InterruptExecutor = InterruptExecutor::new();
/// Medium-priority executor: the periodic controller.
static EXECUTOR_CONTROL: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    EXECUTOR_HALL.on_interrupt()
}

#[interrupt]
unsafe fn SAI1() {
    EXECUTOR_CONTROL.on_interrupt()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // HSE=8MHz feeding the PLL to 170MHz SYSCLK.
    let p = {
        let mut config = embassy_stm32::Config::default();
        {
            use embassy_stm32::rcc::*;
            use embassy_stm32::time::Hertz;
            config.rcc.hse = Some(Hse {
                freq: Hertz(8_000_000),
                mode: HseMode::Oscillator,
            });
            // VCO in: 8MHz / 2 = 4MHz; VCO: 4MHz * 85 = 340MHz; SYSCLK: 340MHz / 2 = 170MHz
            config.rcc.pll = Some(Pll {
                source: PllSource::HSE,
                prediv: PllPreDiv::DIV2,
                mul: PllMul::MUL85,
                divp: None,
                divq: None,
                divr: Some(PllRDiv::DIV2),
            });
            config.rcc.sys = Sysclk::PLL1_R;
            // Above 150MHz, enable Range1 boost mode per RM0440 guidance
            config.rcc.boost = true;
        }
        embassy_stm32::init(config)
    };

    defmt::info!("halldrive starting");

    // Gate drive lines in pattern bit order: A low, A high, B low, B high,
    // C low, C high.  High-side gate drivers are active-low, so they idle
    // high.
    let mut phases = PhaseOutputs::new([
        Output::new(p.PC13, Level::Low, Speed::VeryHigh),
        Output::new(p.PA8, Level::High, Speed::VeryHigh),
        Output::new(p.PA12, Level::Low, Speed::VeryHigh),
        Output::new(p.PA9, Level::High, Speed::VeryHigh),
        Output::new(p.PB15, Level::Low, Speed::VeryHigh),
        Output::new(p.PA10, Level::High, Speed::VeryHigh),
    ]);

    let halls = HallInputs {
        h1: ExtiInput::new(p.PB6, p.EXTI6, Pull::None),
        h2: ExtiInput::new(p.PB7, p.EXTI7, Pull::None),
        h3: ExtiInput::new(p.PB8, p.EXTI8, Pull::None),
    };

    let duty: &'static SharedDuty = DUTY.init(Mutex::new(DutyOutput::new(p.TIM2, p.PA5)));
    duty.lock().await.set_torque(1.0);

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = 115_200;
    let uart = BufferedUart::new(
        p.USART2,
        p.PB4,
        p.PB3,
        Irqs,
        TX_BUF.init_with(|| [0; 256]),
        RX_BUF.init_with(|| [0; 64]),
        uart_config,
    )
    .unwrap();
    let (tx, rx) = uart.split();

    // Home before any edge watcher runs: park at the reference drive state
    // and record where the rotor came to rest.
    let origin = motor::home(&mut phases, &halls).await;
    defmt::info!("rotor origin: sector {}", origin.index());

    interrupt::UART4.set_priority(Priority::P6);
    let hall_spawner = EXECUTOR_HALL.start(interrupt::UART4);
    interrupt::SAI1.set_priority(Priority::P7);
    let control_spawner = EXECUTOR_CONTROL.start(interrupt::SAI1);

    hall_spawner
        .spawn(motor::hall_watcher(halls, phases, origin))
        .unwrap();
    control_spawner
        .spawn(motor::control_task(&PARAMS, duty))
        .unwrap();
    spawner.spawn(motor::tick_task()).unwrap();
    spawner
        .spawn(console::console_task(rx, &PARAMS, duty))
        .unwrap();
    spawner.spawn(report::reporter_task(tx)).unwrap();
    spawner.spawn(melody::melody_task(&PARAMS, duty)).unwrap();
    spawner.spawn(hasher::hasher_task(&PARAMS)).unwrap();

    defmt::info!("all tasks running");

    // Heartbeat on the status LED.
    let mut led = Output::new(p.PC6, Level::Low, Speed::Low);
    loop {
        led.set_high();
        Timer::after_millis(100).await;
        led.set_low();
        Timer::after_millis(900).await;
    }
}
