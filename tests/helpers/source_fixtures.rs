//! Perl sources used across integration tests

/// A small module exercising every stub-producing declaration.
pub const MODULE: &str = r#"package Acme::Counter;
use strict;
use warnings;

our $VERSION = '0.01';
our @EXPORT_OK = qw(new);
my %registry;

sub new {
    my ($class, %args) = @_;
    my $self = bless { count => 0, %args }, $class;
    $registry{$self} = 1;
    return $self;
}

sub increment {
    my $self = shift;
    $self->{count}++;
    return $self->{count};
}

1;
"#;

/// Two packages in one file, statement and block form.
pub const TWO_PACKAGES: &str = r#"package First;
our $name = 'first';

package Second {
    our $name = 'second';
    sub hello { print "hi\n"; }
}

our $after;
"#;

/// Loops, conditions and modifiers.
pub const CONTROL_FLOW: &str = r#"my @items = (1, 2, 3);
for my $item (@items) {
    next if $item == 2;
    print $item;
}
while (my $line = shift @items) {
    last unless defined $line;
}
if ($items[0]) { local $_ = 1; } elsif (@items > 2) { state $seen; } else { }
"#;
