/// Render a message template: `msg!(MESSAGES.instance.start_success, name = n, url = u)`.
#[macro_export]
macro_rules! msg {
    ($template:expr) => {
        $crate::builder::MessageBuilder::new($template).build()
    };
    ($template:expr, $($key:ident = $value:expr),+ $(,)?) => {
        $crate::builder::MessageBuilder::new($template)
            $(.var(stringify!($key), $value))+
            .build()
    };
}
